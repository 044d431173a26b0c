//! The promoted-content source.

use super::{Ad, FeedError};

/// An opaque source of promoted items, separate from the feed itself.
///
/// Ads are interleaved into the rendered feed after every Nth real post (see
/// `FeedState`), but they never count towards emptiness and the feed keeps
/// working when the inventory runs dry.
pub trait AdSource: Send {
    /// Fetch the next promoted item, or `None` when the inventory is
    /// exhausted. Exhaustion is not an error.
    fn fetch_ad(&self) -> Result<Option<Ad>, FeedError>;
}
