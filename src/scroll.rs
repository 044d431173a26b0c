//! Infinite scroll trigger.
//!
//! The terminal equivalent of an end-of-list sentinel entering the viewport:
//! when the cursor gets within `lookahead` items of the end of the rendered
//! feed, the next page should be requested — once. The in-flight guard lives
//! in the cache, so repeated ticks while a fetch is outstanding stay no-ops.

use crate::feed::FeedQuery;

/// How close to the end the selection must get before the next page is
/// requested.
pub const DEFAULT_LOOKAHEAD: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct ScrollTrigger {
    lookahead: usize,
    /// Preview feeds never fetch on scroll, regardless of position.
    enabled: bool,
}

impl ScrollTrigger {
    pub fn new(lookahead: usize, enabled: bool) -> Self {
        Self { lookahead, enabled }
    }

    /// Trigger configuration for a feed query: disabled for previews.
    pub fn for_query(query: &FeedQuery) -> Self {
        Self::new(DEFAULT_LOOKAHEAD, !query.is_preview())
    }

    /// Whether the end-of-list sentinel is currently in view.
    ///
    /// `last_visible` is the index of the item the cursor sits on; `total`
    /// is the rendered item count. The caller fires on the false→true edge
    /// of this signal, so a failed fetch is not hammered with retries while
    /// the cursor sits still.
    pub fn sentinel_visible(&self, last_visible: usize, total: usize) -> bool {
        if !self.enabled || total == 0 {
            return false;
        }
        last_visible + self.lookahead + 1 >= total
    }

    /// Whether a page fetch should be dispatched right now: the sentinel is
    /// in view, there is more to fetch, and no fetch is outstanding.
    pub fn should_fetch(
        &self,
        last_visible: usize,
        total: usize,
        can_fetch_more: bool,
        fetch_in_flight: bool,
    ) -> bool {
        can_fetch_more && !fetch_in_flight && self.sentinel_visible(last_visible, total)
    }
}
