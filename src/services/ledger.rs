//! Time-windowed link ledger.
//!
//! Maps canonical URLs to the identity that last posted them and when.
//! Entries expire after a fixed window (12 hours by default) and are swept
//! on access rather than by a background timer; with a single logical owner
//! of all mutable state there is no concurrency layer to justify an eviction
//! thread. An LRU capacity bound backstops the sweep so the ledger stays
//! bounded even under a flood of unique links.

use crate::models::{CanonicalUrl, Identity, LinkEntry};
use lru::LruCache;
use std::num::NonZeroUsize;
use tracing::debug;

/// Ledger of recently posted links.
pub struct LinkLedger {
    /// Canonical URL -> last posting. LRU-bounded; TTL-swept on access.
    entries: LruCache<CanonicalUrl, LinkEntry>,
    /// Observation window in seconds.
    ttl_secs: u64,
}

impl LinkLedger {
    /// Creates an empty ledger.
    ///
    /// `capacity` is clamped to at least 1.
    #[must_use]
    pub fn new(capacity: usize, ttl_secs: u64) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(cap),
            ttl_secs,
        }
    }

    /// Restores a ledger from persisted entries.
    ///
    /// Entries beyond capacity are dropped oldest-first.
    #[must_use]
    pub fn from_entries<I>(capacity: usize, ttl_secs: u64, entries: I) -> Self
    where
        I: IntoIterator<Item = (CanonicalUrl, LinkEntry)>,
    {
        let mut ledger = Self::new(capacity, ttl_secs);
        let mut sorted: Vec<_> = entries.into_iter().collect();
        // Oldest first, so the most recent postings survive the LRU bound.
        sorted.sort_by_key(|(_, entry)| entry.posted_at);
        for (url, entry) in sorted {
            ledger.entries.put(url, entry);
        }
        ledger
    }

    /// Removes every entry older than the observation window.
    ///
    /// Returns the number of entries evicted. Called before every lookup or
    /// insert; this sweep is the ledger's only time-based resource policy.
    pub fn evict_expired(&mut self, now: u64) -> usize {
        let ttl = self.ttl_secs;
        let expired: Vec<CanonicalUrl> = self
            .entries
            .iter()
            .filter(|(_, entry)| now.saturating_sub(entry.posted_at) > ttl)
            .map(|(url, _)| url.clone())
            .collect();

        for url in &expired {
            self.entries.pop(url);
            debug!(url = %url, "evicted expired link");
        }

        let evicted = expired.len();
        if evicted > 0 {
            metrics::gauge!("dejavu_ledger_size").set(usize_to_f64(self.entries.len()));
        }
        evicted
    }

    /// Looks up a link without disturbing its entry.
    #[must_use]
    pub fn peek(&self, url: &CanonicalUrl) -> Option<&LinkEntry> {
        self.entries.peek(url)
    }

    /// Records a posting, inserting or overwriting the entry for `url`.
    pub fn record(&mut self, url: CanonicalUrl, poster: Identity, now: u64) {
        debug!(url = %url, poster = %poster, "recorded link");
        self.entries.put(url, LinkEntry { poster, posted_at: now });
        metrics::gauge!("dejavu_ledger_size").set(usize_to_f64(self.entries.len()));
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        metrics::gauge!("dejavu_ledger_size").set(0.0);
    }

    /// Returns the number of tracked links, including entries that have
    /// expired but not yet been swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no links are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the configured observation window in seconds.
    #[must_use]
    pub const fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Iterates over all entries (for persistence snapshots).
    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalUrl, &LinkEntry)> {
        self.entries.iter()
    }
}

/// Converts usize to f64 for metrics, capping at `u32::MAX`.
#[inline]
fn usize_to_f64(value: usize) -> f64 {
    let capped = u32::try_from(value).unwrap_or(u32::MAX);
    f64::from(capped)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: u64 = 3600;
    const TTL: u64 = 12 * HOUR;

    fn url(s: &str) -> CanonicalUrl {
        CanonicalUrl::new(s)
    }

    #[test]
    fn test_record_and_peek() {
        let mut ledger = LinkLedger::new(100, TTL);
        ledger.record(url("http://example.com/a"), Identity::new("alice"), 1000);

        let entry = ledger.peek(&url("http://example.com/a")).expect("entry");
        assert_eq!(entry.poster, Identity::new("alice"));
        assert_eq!(entry.posted_at, 1000);
    }

    #[test]
    fn test_evict_expired_removes_old_entries() {
        let mut ledger = LinkLedger::new(100, TTL);
        let t0 = 1_000_000;
        ledger.record(url("http://old.com/a"), Identity::new("alice"), t0);
        ledger.record(url("http://new.com/b"), Identity::new("bob"), t0 + 10 * HOUR);

        // 13 hours after t0: the first entry is past the window, the second
        // is 3 hours old.
        let evicted = ledger.evict_expired(t0 + 13 * HOUR);
        assert_eq!(evicted, 1);
        assert!(ledger.peek(&url("http://old.com/a")).is_none());
        assert!(ledger.peek(&url("http://new.com/b")).is_some());
    }

    #[test]
    fn test_entry_at_exact_window_boundary_survives() {
        let mut ledger = LinkLedger::new(100, TTL);
        ledger.record(url("http://example.com/a"), Identity::new("alice"), 0);
        // Strictly older than TTL is evicted; exactly TTL old is not.
        assert_eq!(ledger.evict_expired(TTL), 0);
        assert_eq!(ledger.evict_expired(TTL + 1), 1);
    }

    #[test]
    fn test_capacity_bound_drops_least_recent() {
        let mut ledger = LinkLedger::new(2, TTL);
        ledger.record(url("http://a.com/"), Identity::new("a"), 1);
        ledger.record(url("http://b.com/"), Identity::new("b"), 2);
        ledger.record(url("http://c.com/"), Identity::new("c"), 3);

        assert_eq!(ledger.len(), 2);
        assert!(ledger.peek(&url("http://a.com/")).is_none());
    }

    #[test]
    fn test_from_entries_keeps_newest_under_capacity() {
        let entries = vec![
            (url("http://a.com/"), LinkEntry { poster: Identity::new("a"), posted_at: 30 }),
            (url("http://b.com/"), LinkEntry { poster: Identity::new("b"), posted_at: 10 }),
            (url("http://c.com/"), LinkEntry { poster: Identity::new("c"), posted_at: 20 }),
        ];
        let ledger = LinkLedger::from_entries(2, TTL, entries);
        assert_eq!(ledger.len(), 2);
        // The oldest posting was dropped by the LRU bound.
        assert!(ledger.peek(&url("http://b.com/")).is_none());
        assert!(ledger.peek(&url("http://a.com/")).is_some());
    }

    #[test]
    fn test_clear() {
        let mut ledger = LinkLedger::new(100, TTL);
        ledger.record(url("http://a.com/"), Identity::new("a"), 1);
        ledger.clear();
        assert!(ledger.is_empty());
    }
}
