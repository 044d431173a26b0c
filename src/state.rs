//! Paginated feed state.
//!
//! [`FeedState`] is one mounted feed instance: it owns the query identity it
//! reads, the page size, the ad-injection interval, and the per-instance
//! bits (fetched ad inventory, the empty-feed notification latch, the last
//! fetch error). The pages themselves live in the shared [`FeedCache`], so
//! any number of instances with the same query identity observe the same
//! sequence and each other's mutations.
//!
//! All methods are synchronous with respect to the cache; network work is
//! delegated to the fetch worker through [`FetchDispatch`] and applied when
//! the main loop routes the results back in.

use log::{debug, warn};

use crate::cache::{FeedCache, RequestId};
use crate::fetch::{FetchDispatch, FetchRequest};
use crate::feed::{Ad, FeedError, FeedItem, FeedQuery, Post};

/// One mounted feed instance bound to a query identity.
pub struct FeedState {
    query: FeedQuery,
    page_size: usize,
    /// Insert one promoted item after every this-many real posts within a
    /// page; 0 disables ads.
    ad_interval: usize,
    /// Current column count, re-derived by the renderer and mirrored here
    /// for analytics coordinates.
    columns: usize,
    /// Distinguishes this instance's ad traffic from a previous instance
    /// that used the same query identity.
    generation: u64,
    ads: Vec<Ad>,
    ads_requested: usize,
    ad_source_dry: bool,
    last_error: Option<String>,
    empty_notified: bool,
    empty_event_pending: bool,
}

impl FeedState {
    pub fn new(
        query: FeedQuery,
        page_size: usize,
        ad_interval: usize,
        columns: usize,
        generation: u64,
    ) -> Self {
        Self {
            query,
            page_size,
            ad_interval,
            columns,
            generation,
            ads: Vec::new(),
            ads_requested: 0,
            ad_source_dry: false,
            last_error: None,
            empty_notified: false,
            empty_event_pending: false,
        }
    }

    pub fn query(&self) -> &FeedQuery {
        &self.query
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Renderer pushes the freshly derived column count here every frame so
    /// action analytics always carry current coordinates.
    pub fn set_columns(&mut self, columns: usize) {
        self.columns = columns.max(1);
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // -- rendered sequence ---------------------------------------------------

    /// The concatenated item sequence: cached posts addressed by
    /// (page, in-page index), promoted items interleaved after every Nth
    /// post of a page, and page-size placeholders while a fetch is loading.
    pub fn items(&self, cache: &FeedCache) -> Vec<FeedItem> {
        let entry = cache.entry(&self.query);
        let first_fetch_done = entry.map(|e| e.first_fetch_done()).unwrap_or(false);
        let fetching = entry.map(|e| e.is_fetching()).unwrap_or(false);

        let mut items = Vec::new();
        let mut ad_slot = 0;
        if let Some(entry) = entry {
            for (page, feed_page) in entry.pages().iter().enumerate() {
                for (index, post) in feed_page.posts.iter().enumerate() {
                    items.push(FeedItem::Post {
                        page,
                        index,
                        post: post.clone(),
                    });
                    if self.ad_interval > 0 && (index + 1) % self.ad_interval == 0 {
                        // Each slot binds to one ad; a slot whose ad has not
                        // arrived stays collapsed rather than borrowing a
                        // later one, so filled slots never reshuffle.
                        if let Some(ad) = self.ads.get(ad_slot) {
                            items.push(FeedItem::Ad(ad.clone()));
                        }
                        ad_slot += 1;
                    }
                }
            }
        }

        // Layout-stable placeholders: a full page of them before the first
        // data arrives, and again at the tail while the next page loads.
        if !first_fetch_done || fetching {
            let base = items.len();
            for i in 0..self.page_size {
                items.push(FeedItem::Placeholder { position: base + i });
            }
        }
        items
    }

    /// The feed is empty when the first fetch completed and produced no
    /// posts. Promoted items never count.
    pub fn is_empty(&self, cache: &FeedCache) -> bool {
        cache
            .entry(&self.query)
            .map(|e| e.first_fetch_done() && e.post_count() == 0)
            .unwrap_or(false)
    }

    pub fn can_fetch_more(&self, cache: &FeedCache) -> bool {
        cache.entry(&self.query).map(|e| e.has_next()).unwrap_or(true)
    }

    pub fn is_fetching(&self, cache: &FeedCache) -> bool {
        cache
            .entry(&self.query)
            .map(|e| e.is_fetching())
            .unwrap_or(false)
    }

    // -- fetching ------------------------------------------------------------

    /// Request the next page, continuing from the last known cursor.
    ///
    /// A quiet no-op while a fetch for this identity is outstanding or when
    /// the feed is exhausted. Only a dispatch failure is an error; it leaves
    /// the cache ready for a retry.
    pub fn fetch_page(
        &mut self,
        cache: &mut FeedCache,
        dispatch: &dyn FetchDispatch,
    ) -> Result<(), FeedError> {
        let Some(id) = cache.begin_fetch(&self.query) else {
            return Ok(());
        };
        let cursor = cache
            .entry(&self.query)
            .and_then(|e| e.next_cursor().map(String::from));
        let request = FetchRequest::Page {
            id,
            query: self.query.clone(),
            cursor,
            first: self.page_size,
        };
        match dispatch.dispatch(request) {
            Ok(()) => {
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                cache.abort_fetch(&self.query, id);
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Called by the composition layer after a page result for this query
    /// identity was applied to the cache: runs the per-instance follow-ups
    /// (empty-feed latch, topping up the ad inventory).
    pub fn on_page_applied(&mut self, cache: &FeedCache, dispatch: &dyn FetchDispatch) {
        self.last_error = None;

        if self.is_empty(cache) && !self.empty_notified {
            self.empty_notified = true;
            self.empty_event_pending = true;
            debug!("feed {} is empty", self.query);
        }

        if self.ad_interval == 0 || self.ad_source_dry {
            return;
        }
        let wanted: usize = cache
            .entry(&self.query)
            .map(|e| {
                e.pages()
                    .iter()
                    .map(|p| p.posts.len() / self.ad_interval)
                    .sum()
            })
            .unwrap_or(0);
        if wanted > self.ads_requested {
            let count = wanted - self.ads_requested;
            match dispatch.dispatch(FetchRequest::Ads {
                generation: self.generation,
                count,
            }) {
                // Promoted content is best-effort; the feed works without it.
                Ok(()) => self.ads_requested = wanted,
                Err(e) => warn!("ad request failed: {e}"),
            }
        }
    }

    /// Called when a page fetch for this identity failed. Previously fetched
    /// items stay visible; the error is surfaced, not thrown.
    pub fn on_fetch_error(&mut self, error: String) {
        warn!("page fetch for {} failed: {error}", self.query);
        self.last_error = Some(error);
    }

    /// Route one promoted item (or an exhaustion notice) fetched for this
    /// instance's generation.
    pub fn on_ad(&mut self, ad: Option<Ad>) {
        match ad {
            Some(ad) => self.ads.push(ad),
            None => self.ad_source_dry = true,
        }
    }

    /// Promoted items fetched so far for this instance.
    pub fn ads_available(&self) -> usize {
        self.ads.len()
    }

    /// One-shot empty-feed notification: true exactly once per transition
    /// into the empty state, false on every later call.
    pub fn take_empty_feed_event(&mut self) -> bool {
        std::mem::take(&mut self.empty_event_pending)
    }

    // -- mutations -----------------------------------------------------------

    /// Replace a post's payload in place. Never triggers a fetch; a stale
    /// address (out of bounds after a concurrent removal) is a silent no-op.
    pub fn update_post(
        &self,
        cache: &mut FeedCache,
        page: usize,
        index: usize,
        patch: impl FnOnce(&mut Post),
    ) -> bool {
        cache.patch_post(&self.query, page, index, patch)
    }

    /// Splice a post out of its page. Later in-page indices shift down by
    /// one; unmoved items keep their keys.
    pub fn remove_post(&self, cache: &mut FeedCache, page: usize, index: usize) -> bool {
        cache.remove_post(&self.query, page, index)
    }
}

/// Convenience for the composition layer: apply a page result arriving from
/// the worker to the cache, reporting whether it was applied (fresh) or
/// dropped (stale id).
pub fn apply_page_result(
    cache: &mut FeedCache,
    query: &FeedQuery,
    id: RequestId,
    result: &Result<crate::feed::FeedPage, String>,
) -> bool {
    match result {
        Ok(page) => cache.complete_fetch(query, id, page.clone()),
        Err(_) => cache.fail_fetch(query, id),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
