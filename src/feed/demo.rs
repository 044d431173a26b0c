//! Deterministic offline sources, so the binary runs without a backend
//! (`--demo`) and integration-style tests have predictable data.

use std::sync::Mutex;

use chrono::{Duration, TimeZone, Utc};

use super::{Ad, AdSource, FeedError, FeedKind, FeedPage, FeedQuery, Post, RemoteAction, Vote};

const TITLES: &[&str] = &[
    "Zero-cost abstractions, measured",
    "Lifetimes without tears",
    "Profiling a slow build",
    "Iterators all the way down",
    "When to reach for unsafe",
    "Error handling at the boundary",
    "Designing a plugin API",
    "The case for smaller crates",
];

const SOURCES: &[&str] = &["rustblog", "systems-weekly", "kernelnotes", "webperf"];

/// A deterministic in-process feed: `pages` pages of `page_size` posts each,
/// cursors are page numbers, content derives from the post's position.
pub struct DemoSource {
    pages: usize,
}

impl DemoSource {
    pub fn new(pages: usize) -> Self {
        Self { pages }
    }

    fn make_post(query: &FeedQuery, page: usize, index: usize) -> Post {
        let n = page * 100 + index;
        let base = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        let source_name = match &query.kind {
            FeedKind::Squad(handle) => handle.clone(),
            _ => SOURCES[n % SOURCES.len()].to_string(),
        };
        Post {
            id: format!("demo-{}-{n}", query.kind.name()),
            title: format!("{} #{n}", TITLES[n % TITLES.len()]),
            url: Some(format!("https://demo.devfeed.local/posts/{n}")),
            source_name,
            author: Some(format!("author{}", n % 5)),
            created_at: Some(base - Duration::hours(n as i64)),
            read_time: Some(3 + (n % 12) as u32),
            num_upvotes: (n * 7 % 400) as i64,
            num_comments: (n * 3 % 50) as i64,
            vote: Vote::None,
            bookmarked: false,
            summary: Some("A generated demo post for offline browsing.".to_string()),
            tags: vec!["demo".to_string(), format!("tag{}", n % 4)],
        }
    }
}

impl super::FeedSource for DemoSource {
    fn name(&self) -> &str {
        "demo"
    }

    fn fetch_page(
        &self,
        query: &FeedQuery,
        cursor: Option<&str>,
        first: usize,
    ) -> Result<FeedPage, FeedError> {
        let page: usize = match cursor {
            Some(raw) => raw
                .parse()
                .map_err(|_| FeedError::Remote(format!("unknown cursor `{raw}`")))?,
            None => 0,
        };
        if page >= self.pages {
            return Ok(FeedPage::empty());
        }

        let posts = (0..first)
            .map(|i| Self::make_post(query, page, i))
            .collect();
        let has_next = page + 1 < self.pages;
        let cursor = has_next.then(|| (page + 1).to_string());
        Ok(FeedPage::new(posts, cursor, has_next))
    }

    fn apply_action(&self, _post_id: &str, _action: RemoteAction) -> Result<(), FeedError> {
        Ok(())
    }
}

/// A bounded promoted-content inventory. Once `remaining` hits zero the
/// source reports exhaustion, which the feed must tolerate.
pub struct DemoAdSource {
    remaining: Mutex<usize>,
    served: Mutex<usize>,
}

impl DemoAdSource {
    pub fn new(inventory: usize) -> Self {
        Self {
            remaining: Mutex::new(inventory),
            served: Mutex::new(0),
        }
    }
}

impl AdSource for DemoAdSource {
    fn fetch_ad(&self) -> Result<Option<Ad>, FeedError> {
        let mut remaining = self.remaining.lock().expect("ad inventory lock");
        if *remaining == 0 {
            return Ok(None);
        }
        *remaining -= 1;

        let mut served = self.served.lock().expect("ad counter lock");
        *served += 1;
        let n = *served;
        Ok(Some(Ad {
            id: format!("demo-ad-{n}"),
            title: format!("Sponsored: build faster with FerrisCI ({n})"),
            link: "https://ads.devfeed.local/ferrisci".to_string(),
            company: "FerrisCI".to_string(),
        }))
    }
}
