//! One fetched batch of feed items.

use super::Post;

/// A page of posts plus the continuation cursor for the next fetch.
///
/// Item order within a page is fixed at fetch time. Pages are concatenated
/// in fetch order to form the visible feed; the only structural changes
/// allowed afterwards are whole-item replacement and removal.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    pub posts: Vec<Post>,
    /// Opaque continuation cursor. Treated as an uninterpreted token and
    /// handed back verbatim on the next fetch, so a failed fetch can be
    /// retried with the same cursor.
    pub cursor: Option<String>,
    /// Whether the backend reports more pages after this one.
    pub has_next: bool,
}

impl FeedPage {
    pub fn new(posts: Vec<Post>, cursor: Option<String>, has_next: bool) -> Self {
        Self {
            posts,
            cursor,
            has_next,
        }
    }

    /// A terminal empty page: no items, no continuation.
    pub fn empty() -> Self {
        Self {
            posts: Vec::new(),
            cursor: None,
            has_next: false,
        }
    }
}
