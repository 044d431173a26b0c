//! The client-side feed cache.
//!
//! An explicit keyed store: one [`CacheEntry`] per [`FeedQuery`], holding the
//! fetched pages, the continuation cursor, and the in-flight request marker
//! that keeps page fetches strictly sequential per identity. Every feed
//! instance reading the same query identity observes the same entry, so a
//! patch applied through one instance is visible to all of them.
//!
//! Consumers subscribe by version: each entry carries a counter bumped on
//! every visible change, and a renderer that remembers the last version it
//! drew can tell whether anything happened since. All access goes through
//! `&mut self` on the UI thread; the fetch worker never touches the cache
//! directly, it only sends messages back.

use std::collections::HashMap;

use crate::feed::{FeedPage, FeedQuery, Post};

/// Identifies one dispatched page fetch, so late or duplicate results can be
/// recognised and dropped.
pub type RequestId = u64;

/// Cached state for a single query identity.
#[derive(Debug, Default)]
pub struct CacheEntry {
    pages: Vec<FeedPage>,
    next_cursor: Option<String>,
    /// `None` until the first fetch reports; fetching is allowed while `None`.
    has_next: Option<bool>,
    first_fetch_done: bool,
    in_flight: Option<RequestId>,
    version: u64,
}

impl CacheEntry {
    pub fn pages(&self) -> &[FeedPage] {
        &self.pages
    }

    pub fn post_count(&self) -> usize {
        self.pages.iter().map(|p| p.posts.len()).sum()
    }

    pub fn first_fetch_done(&self) -> bool {
        self.first_fetch_done
    }

    pub fn has_next(&self) -> bool {
        self.has_next.unwrap_or(true)
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }
}

/// Process-wide feed cache, keyed by query identity.
#[derive(Debug, Default)]
pub struct FeedCache {
    entries: HashMap<FeedQuery, CacheEntry>,
    next_request: RequestId,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, query: &FeedQuery) -> Option<&CacheEntry> {
        self.entries.get(query)
    }

    /// Current change counter for `query`; 0 when nothing is cached yet.
    pub fn version(&self, query: &FeedQuery) -> u64 {
        self.entries.get(query).map(|e| e.version).unwrap_or(0)
    }

    /// Mark a page fetch as started and hand out its request id.
    ///
    /// Returns `None` — and changes nothing — while another fetch for the
    /// same identity is outstanding or the entry is exhausted. This is what
    /// makes page fetches strictly sequential per identity.
    pub fn begin_fetch(&mut self, query: &FeedQuery) -> Option<RequestId> {
        let entry = self.entries.entry(query.clone()).or_default();
        if entry.in_flight.is_some() || !entry.has_next() {
            return None;
        }
        self.next_request += 1;
        entry.in_flight = Some(self.next_request);
        // Loading is a visible state (placeholders appear), so subscribers
        // get a version bump here too.
        entry.version += 1;
        Some(self.next_request)
    }

    /// Drop the in-flight marker for a request that never made it to the
    /// worker (dispatch failed).
    pub fn abort_fetch(&mut self, query: &FeedQuery, id: RequestId) {
        if let Some(entry) = self.entries.get_mut(query) {
            if entry.in_flight == Some(id) {
                entry.in_flight = None;
            }
        }
    }

    /// Apply a successfully fetched page.
    ///
    /// Returns `false` (and applies nothing) when `id` does not match the
    /// entry's outstanding request — a late result after an invalidation, or
    /// a duplicate. Empty pages update the cursor bookkeeping but are not
    /// stored, so emptiness remains "zero pages fetched".
    pub fn complete_fetch(&mut self, query: &FeedQuery, id: RequestId, page: FeedPage) -> bool {
        let Some(entry) = self.entries.get_mut(query) else {
            return false;
        };
        if entry.in_flight != Some(id) {
            return false;
        }
        entry.in_flight = None;
        entry.first_fetch_done = true;
        entry.next_cursor = page.cursor.clone();
        entry.has_next = Some(page.has_next);
        if !page.posts.is_empty() {
            entry.pages.push(page);
        }
        entry.version += 1;
        true
    }

    /// Record a failed fetch: the in-flight marker is cleared so the caller
    /// may retry, and previously fetched pages stay untouched.
    pub fn fail_fetch(&mut self, query: &FeedQuery, id: RequestId) -> bool {
        let Some(entry) = self.entries.get_mut(query) else {
            return false;
        };
        if entry.in_flight != Some(id) {
            return false;
        }
        entry.in_flight = None;
        true
    }

    /// Replace a single post's payload in place. Out-of-bounds addresses are
    /// a no-op; the index may be stale after a concurrent removal.
    pub fn patch_post(
        &mut self,
        query: &FeedQuery,
        page: usize,
        index: usize,
        patch: impl FnOnce(&mut Post),
    ) -> bool {
        let Some(entry) = self.entries.get_mut(query) else {
            return false;
        };
        let Some(post) = entry.pages.get_mut(page).and_then(|p| p.posts.get_mut(index)) else {
            return false;
        };
        patch(post);
        entry.version += 1;
        true
    }

    /// Splice a post out of its page, shifting later in-page indices down by
    /// one. Items that did not move keep their identity.
    pub fn remove_post(&mut self, query: &FeedQuery, page: usize, index: usize) -> bool {
        let Some(entry) = self.entries.get_mut(query) else {
            return false;
        };
        let Some(feed_page) = entry.pages.get_mut(page) else {
            return false;
        };
        if index >= feed_page.posts.len() {
            return false;
        }
        feed_page.posts.remove(index);
        entry.version += 1;
        true
    }

    /// Locate a post by id across all cached pages of `query`.
    pub fn find_post(&self, query: &FeedQuery, post_id: &str) -> Option<(usize, usize)> {
        let entry = self.entries.get(query)?;
        for (page_index, page) in entry.pages.iter().enumerate() {
            if let Some(index) = page.posts.iter().position(|p| p.id == post_id) {
                return Some((page_index, index));
            }
        }
        None
    }

    /// Drop everything cached for `query`. The next `begin_fetch` starts
    /// from the first page; an in-flight result for the old entry will no
    /// longer match and is ignored on arrival.
    pub fn invalidate(&mut self, query: &FeedQuery) {
        if let Some(entry) = self.entries.get_mut(query) {
            let version = entry.version;
            *entry = CacheEntry::default();
            entry.version = version + 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::testutil::page_of;
    use crate::feed::{FeedKind, FeedPage};

    fn query() -> FeedQuery {
        FeedQuery::new(FeedKind::Popular)
    }

    // -- fetch sequencing ----------------------------------------------------

    #[test]
    fn second_begin_fetch_is_refused_while_one_is_outstanding() {
        let mut cache = FeedCache::new();
        let q = query();

        let first = cache.begin_fetch(&q);
        assert!(first.is_some());
        assert!(cache.begin_fetch(&q).is_none(), "strictly sequential");

        cache.complete_fetch(&q, first.unwrap(), page_of(&["a"], Some("c"), true));
        assert!(cache.begin_fetch(&q).is_some(), "free again after completion");
    }

    #[test]
    fn begin_fetch_refused_when_exhausted() {
        let mut cache = FeedCache::new();
        let q = query();

        let id = cache.begin_fetch(&q).unwrap();
        cache.complete_fetch(&q, id, page_of(&["a"], None, false));

        assert!(cache.begin_fetch(&q).is_none(), "has_next is false");
    }

    #[test]
    fn late_result_with_stale_id_is_dropped() {
        let mut cache = FeedCache::new();
        let q = query();

        let stale = cache.begin_fetch(&q).unwrap();
        cache.invalidate(&q);
        let fresh = cache.begin_fetch(&q).unwrap();
        assert_ne!(stale, fresh);

        assert!(!cache.complete_fetch(&q, stale, page_of(&["old"], None, false)));
        assert_eq!(cache.entry(&q).unwrap().post_count(), 0);

        assert!(cache.complete_fetch(&q, fresh, page_of(&["new"], None, false)));
        assert_eq!(cache.entry(&q).unwrap().post_count(), 1);
    }

    #[test]
    fn failed_fetch_retains_prior_pages_and_allows_retry() {
        let mut cache = FeedCache::new();
        let q = query();

        let id = cache.begin_fetch(&q).unwrap();
        cache.complete_fetch(&q, id, page_of(&["a", "b"], Some("c1"), true));

        let id = cache.begin_fetch(&q).unwrap();
        assert!(cache.fail_fetch(&q, id));

        let entry = cache.entry(&q).unwrap();
        assert_eq!(entry.post_count(), 2, "prior state retained");
        assert_eq!(entry.next_cursor(), Some("c1"), "retry reuses the cursor");
        assert!(!entry.is_fetching());
    }

    #[test]
    fn empty_page_is_not_stored_but_finishes_the_first_fetch() {
        let mut cache = FeedCache::new();
        let q = query();

        let id = cache.begin_fetch(&q).unwrap();
        cache.complete_fetch(&q, id, FeedPage::empty());

        let entry = cache.entry(&q).unwrap();
        assert!(entry.first_fetch_done());
        assert_eq!(entry.pages().len(), 0);
        assert!(!entry.has_next());
    }

    // -- mutations -----------------------------------------------------------

    #[test]
    fn patch_post_is_visible_to_other_readers() {
        let mut cache = FeedCache::new();
        let q = query();
        let id = cache.begin_fetch(&q).unwrap();
        cache.complete_fetch(&q, id, page_of(&["a"], None, false));

        assert!(cache.patch_post(&q, 0, 0, |p| p.num_upvotes = 99));

        // A second consumer keyed to an equal query sees the patch.
        let same_identity = FeedQuery::new(FeedKind::Popular);
        let entry = cache.entry(&same_identity).unwrap();
        assert_eq!(entry.pages()[0].posts[0].num_upvotes, 99);
    }

    #[test]
    fn patch_post_out_of_bounds_is_a_noop() {
        let mut cache = FeedCache::new();
        let q = query();
        let id = cache.begin_fetch(&q).unwrap();
        cache.complete_fetch(&q, id, page_of(&["a"], None, false));
        let version = cache.version(&q);

        assert!(!cache.patch_post(&q, 0, 5, |p| p.num_upvotes = 1));
        assert!(!cache.patch_post(&q, 3, 0, |p| p.num_upvotes = 1));
        assert_eq!(cache.version(&q), version, "no-ops do not bump the version");
    }

    #[test]
    fn remove_post_shifts_later_indices_down() {
        let mut cache = FeedCache::new();
        let q = query();
        let id = cache.begin_fetch(&q).unwrap();
        cache.complete_fetch(&q, id, page_of(&["a", "b", "c"], None, false));

        assert!(cache.remove_post(&q, 0, 1));

        let posts = &cache.entry(&q).unwrap().pages()[0].posts;
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "a");
        assert_eq!(posts[1].id, "c", "c moved from index 2 to index 1");
    }

    #[test]
    fn remove_post_out_of_bounds_is_a_noop() {
        let mut cache = FeedCache::new();
        let q = query();
        let id = cache.begin_fetch(&q).unwrap();
        cache.complete_fetch(&q, id, page_of(&["a"], None, false));

        assert!(!cache.remove_post(&q, 0, 1));
        assert!(!cache.remove_post(&q, 9, 0));
        assert_eq!(cache.entry(&q).unwrap().post_count(), 1);
    }

    #[test]
    fn removal_only_touches_the_addressed_page() {
        let mut cache = FeedCache::new();
        let q = query();
        let id = cache.begin_fetch(&q).unwrap();
        cache.complete_fetch(&q, id, page_of(&["a", "b"], Some("c"), true));
        let id = cache.begin_fetch(&q).unwrap();
        cache.complete_fetch(&q, id, page_of(&["x", "y"], None, false));

        cache.remove_post(&q, 0, 0);

        let entry = cache.entry(&q).unwrap();
        assert_eq!(entry.pages()[0].posts[0].id, "b");
        assert_eq!(entry.pages()[1].posts[0].id, "x", "other page untouched");
        assert_eq!(entry.pages()[1].posts[1].id, "y");
    }

    // -- versioning ----------------------------------------------------------

    #[test]
    fn version_bumps_on_every_visible_change() {
        let mut cache = FeedCache::new();
        let q = query();
        assert_eq!(cache.version(&q), 0);

        let id = cache.begin_fetch(&q).unwrap();
        cache.complete_fetch(&q, id, page_of(&["a", "b"], None, true));
        let after_page = cache.version(&q);
        assert!(after_page > 0);

        cache.patch_post(&q, 0, 0, |p| p.toggle_bookmark());
        let after_patch = cache.version(&q);
        assert!(after_patch > after_page);

        cache.remove_post(&q, 0, 1);
        assert!(cache.version(&q) > after_patch);
    }

    #[test]
    fn find_post_locates_across_pages() {
        let mut cache = FeedCache::new();
        let q = query();
        let id = cache.begin_fetch(&q).unwrap();
        cache.complete_fetch(&q, id, page_of(&["a", "b"], Some("c"), true));
        let id = cache.begin_fetch(&q).unwrap();
        cache.complete_fetch(&q, id, page_of(&["x"], None, false));

        assert_eq!(cache.find_post(&q, "x"), Some((1, 0)));
        assert_eq!(cache.find_post(&q, "b"), Some((0, 1)));
        assert_eq!(cache.find_post(&q, "missing"), None);
    }

    #[test]
    fn invalidate_resets_state_but_not_the_version() {
        let mut cache = FeedCache::new();
        let q = query();
        let id = cache.begin_fetch(&q).unwrap();
        cache.complete_fetch(&q, id, page_of(&["a"], None, false));
        let version = cache.version(&q);

        cache.invalidate(&q);

        let entry = cache.entry(&q).unwrap();
        assert_eq!(entry.post_count(), 0);
        assert!(!entry.first_fetch_done());
        assert!(entry.has_next(), "fetching allowed again");
        assert!(cache.version(&q) > version, "subscribers see the reset");
    }
}
