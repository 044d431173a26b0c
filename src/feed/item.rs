//! The core data types shared across the feed pipeline.
//!
//! A [`Post`] is one entry from the remote aggregation service, normalised
//! from the wire format so the rest of the application stays source-agnostic.
//! The rendered feed is a sequence of [`FeedItem`]s: real posts addressed by
//! their (page, in-page index) position, promoted [`Ad`]s interleaved between
//! them, and layout-stable [`Placeholder`](FeedItem::Placeholder)s shown
//! while a page is still loading.

use chrono::{DateTime, Utc};

/// The user's vote on a post. Upvote and downvote are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Vote {
    #[default]
    None,
    Up,
    Down,
}

/// A single post, normalised from the remote feed service.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    /// Stable identifier assigned by the backend.
    pub id: String,
    pub title: String,
    /// Link to the full article.
    pub url: Option<String>,
    /// Publisher or squad the post belongs to.
    pub source_name: String,
    pub author: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// Estimated read time in minutes, when the backend provides one.
    pub read_time: Option<u32>,
    pub num_upvotes: i64,
    pub num_comments: i64,
    pub vote: Vote,
    pub bookmarked: bool,
    pub summary: Option<String>,
    pub tags: Vec<String>,
}

impl Post {
    /// Toggle the upvote. Re-upvoting clears it; upvoting over a downvote
    /// replaces it. The local count is adjusted optimistically and reconciled
    /// against the remote result by the caller.
    pub fn toggle_upvote(&mut self) {
        match self.vote {
            Vote::Up => {
                self.vote = Vote::None;
                self.num_upvotes -= 1;
            }
            _ => {
                self.vote = Vote::Up;
                self.num_upvotes += 1;
            }
        }
    }

    /// Toggle the downvote. Downvoting over an upvote removes the upvote
    /// (and its count) first.
    pub fn toggle_downvote(&mut self) {
        match self.vote {
            Vote::Down => self.vote = Vote::None,
            Vote::Up => {
                self.num_upvotes -= 1;
                self.vote = Vote::Down;
            }
            Vote::None => self.vote = Vote::Down,
        }
    }

    pub fn toggle_bookmark(&mut self) {
        self.bookmarked = !self.bookmarked;
    }
}

/// A promoted item fetched from the ad service, never from the feed itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Ad {
    pub id: String,
    pub title: String,
    pub link: String,
    pub company: String,
}

/// One position in the rendered feed.
///
/// `Post` carries the page index and in-page index used to address it for
/// mutation and removal; `Ad` and `Placeholder` are synthetic and never
/// addressed that way.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedItem {
    Post {
        /// Index of the page this post was fetched in.
        page: usize,
        /// Index within that page.
        index: usize,
        post: Post,
    },
    Ad(Ad),
    Placeholder {
        /// Global position in the rendered sequence, so each placeholder
        /// gets its own list key.
        position: usize,
    },
}

impl FeedItem {
    /// Stable list key for this item.
    ///
    /// * the same logical post keeps its key across refetches of its page;
    /// * a placeholder's key differs from the real item that replaces it,
    ///   forcing a remount rather than a patch of transient visual state;
    /// * ad keys live in their own namespace and never collide with posts.
    pub fn key(&self) -> String {
        match self {
            FeedItem::Post { post, .. } => format!("post-{}", post.id),
            FeedItem::Ad(ad) => format!("ad-{}", ad.id),
            FeedItem::Placeholder { position } => format!("placeholder-{position}"),
        }
    }

    pub fn as_post(&self) -> Option<&Post> {
        match self {
            FeedItem::Post { post, .. } => Some(post),
            _ => None,
        }
    }

    /// The (page, in-page index) address of a real post, used to route
    /// mutations back to the cache.
    pub fn post_address(&self) -> Option<(usize, usize)> {
        match self {
            FeedItem::Post { page, index, .. } => Some((*page, *index)),
            _ => None,
        }
    }
}
