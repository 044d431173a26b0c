//! Feed data layer.
//!
//! This module defines the domain types ([`Post`], [`Ad`], [`FeedItem`],
//! [`FeedPage`], [`FeedQuery`]) and the [`FeedSource`] / [`AdSource`] traits
//! the fetch worker talks to. Concrete source implementations live in
//! sub-modules: [`http`] speaks JSON-over-HTTP to the real backend, [`demo`]
//! generates deterministic offline data.
//!
//! The rest of the application only sees the traits, so adding another
//! backend is a matter of implementing [`FeedSource`] and wiring it up in
//! `main.rs`.

mod ads;
mod item;
mod page;
mod query;

pub mod demo;
pub mod http;

#[cfg(test)]
pub(crate) mod testutil;

pub use ads::AdSource;
pub use item::{Ad, FeedItem, Post, Vote};
pub use page::FeedPage;
pub use query::{FeedKind, FeedQuery, Ranking};

use thiserror::Error;

/// Errors produced by the feed data layer.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed feed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("feed response missing `{0}`")]
    MissingField(&'static str),
    #[error("feed service returned an error: {0}")]
    Remote(String),
    #[error("fetch worker is no longer running")]
    WorkerGone,
}

/// A write the user performed on a post, forwarded to the backend after the
/// cache was already updated optimistically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteAction {
    /// `true` sets the upvote, `false` clears it.
    Upvote(bool),
    Downvote(bool),
    Bookmark(bool),
    /// Hide the post from this user's feed.
    Hide,
}

/// A paginated remote feed.
///
/// The fetch worker calls [`fetch_page`](FeedSource::fetch_page) on a
/// background thread, so implementations must be [`Send`]. A fetch must be
/// safely retryable by re-invoking it with the same cursor.
pub trait FeedSource: Send {
    /// Human-readable label for the status bar and logs.
    fn name(&self) -> &str;

    /// Fetch one page for `query`, continuing from `cursor` (`None` for the
    /// first page), returning at most `first` posts.
    fn fetch_page(
        &self,
        query: &FeedQuery,
        cursor: Option<&str>,
        first: usize,
    ) -> Result<FeedPage, FeedError>;

    /// Apply a user action remotely. Called after the optimistic local
    /// mutation; an error makes the caller roll that mutation back.
    fn apply_action(&self, post_id: &str, action: RemoteAction) -> Result<(), FeedError>;
}
