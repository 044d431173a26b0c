//! Shared constructors for tests across the crate.

use super::{Ad, FeedPage, Post, Vote};

pub(crate) fn make_post(id: &str, title: &str) -> Post {
    Post {
        id: id.to_string(),
        title: title.to_string(),
        url: Some(format!("https://example.com/{id}")),
        source_name: "test".to_string(),
        author: None,
        created_at: None,
        read_time: None,
        num_upvotes: 0,
        num_comments: 0,
        vote: Vote::None,
        bookmarked: false,
        summary: None,
        tags: Vec::new(),
    }
}

pub(crate) fn make_ad(id: &str) -> Ad {
    Ad {
        id: id.to_string(),
        title: format!("Sponsored {id}"),
        link: "https://ads.example.com".to_string(),
        company: "acme".to_string(),
    }
}

pub(crate) fn page_of(ids: &[&str], cursor: Option<&str>, has_next: bool) -> FeedPage {
    FeedPage::new(
        ids.iter().map(|id| make_post(id, id)).collect(),
        cursor.map(String::from),
        has_next,
    )
}
