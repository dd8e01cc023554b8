//! Repost counting and leaderboard queries.
//!
//! Counts are keyed by canonical identity; callers resolve names through the
//! alias graph before touching the counter. Rankings sort descending by
//! count with a stable sort over first-charge order, so ties break the same
//! way for any given snapshot.

use crate::models::Identity;
use tracing::debug;

/// Per-identity repost counts.
#[derive(Debug, Clone, Default)]
pub struct RepostCounter {
    /// Identity -> count. Entries are created lazily on first charge and
    /// only removed by purge or fold.
    counts: std::collections::HashMap<Identity, u64>,
    /// First-charge order, used as the deterministic tie-break.
    order: Vec<Identity>,
}

impl RepostCounter {
    /// Creates an empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a counter from persisted `(identity, count)` pairs, keeping
    /// their order as the insertion order. Zero counts are skipped.
    #[must_use]
    pub fn from_counts<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Identity, u64)>,
    {
        let mut counter = Self::new();
        for (identity, count) in pairs {
            if count == 0 {
                continue;
            }
            counter.add(&identity, count);
        }
        counter
    }

    /// Charges one repost to an identity and returns its new total.
    pub fn increment(&mut self, identity: &Identity) -> u64 {
        let total = self.add(identity, 1);
        debug!(identity = %identity, count = total, "repost charged");
        total
    }

    /// Adds `amount` to an identity's count and returns the new total.
    fn add(&mut self, identity: &Identity, amount: u64) -> u64 {
        if !self.counts.contains_key(identity) {
            self.order.push(identity.clone());
        }
        let entry = self.counts.entry(identity.clone()).or_insert(0);
        *entry = entry.saturating_add(amount);
        *entry
    }

    /// Returns an identity's count, or 0 if it has none.
    #[must_use]
    pub fn count_for(&self, identity: &Identity) -> u64 {
        self.counts.get(identity).copied().unwrap_or(0)
    }

    /// Folds `from`'s count into `into` and removes `from`.
    ///
    /// Used when a merge consolidates identities and at load time when
    /// stored counts predate a merge. A missing `from` is a no-op.
    pub fn fold(&mut self, from: &Identity, into: &Identity) {
        if from == into {
            return;
        }
        if let Some(count) = self.counts.remove(from) {
            self.order.retain(|id| id != from);
            let total = self.add(into, count);
            debug!(from = %from, into = %into, count = total, "counts folded");
        }
    }

    /// Returns all counts in first-charge order (for persistence snapshots).
    #[must_use]
    pub fn entries(&self) -> Vec<(Identity, u64)> {
        self.order
            .iter()
            .filter_map(|id| self.counts.get(id).map(|count| (id.clone(), *count)))
            .collect()
    }

    /// Returns all non-zero counts, descending, ties in first-charge order.
    #[must_use]
    pub fn ranked(&self) -> Vec<(Identity, u64)> {
        let mut entries: Vec<(Identity, u64)> = self
            .order
            .iter()
            .filter_map(|id| {
                let count = self.count_for(id);
                (count > 0).then(|| (id.clone(), count))
            })
            .collect();
        // Stable sort preserves first-charge order among equal counts.
        entries.sort_by(|(_, a), (_, b)| b.cmp(a));
        entries
    }

    /// Returns an identity's `(count, 1-based rank)`, or `None` if it has
    /// no count.
    #[must_use]
    pub fn rank(&self, identity: &Identity) -> Option<(u64, usize)> {
        let count = self.count_for(identity);
        if count == 0 {
            return None;
        }
        self.ranked()
            .iter()
            .position(|(id, _)| id == identity)
            .map(|idx| (count, idx + 1))
    }

    /// Returns the top `n` identities by count.
    #[must_use]
    pub fn top(&self, n: usize) -> Vec<(Identity, u64)> {
        let mut entries = self.ranked();
        entries.truncate(n);
        entries
    }

    /// Removes an identity's count. Returns `true` if one existed.
    pub fn purge(&mut self, identity: &Identity) -> bool {
        let existed = self.counts.remove(identity).is_some();
        if existed {
            self.order.retain(|id| id != identity);
            debug!(identity = %identity, "count purged");
        }
        existed
    }

    /// Removes all counts.
    pub fn clear(&mut self) {
        self.counts.clear();
        self.order.clear();
    }

    /// Returns the number of identities with a count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns `true` if no identity has a count.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> Identity {
        Identity::new(name)
    }

    #[test]
    fn test_increment_returns_new_total() {
        let mut counter = RepostCounter::new();
        assert_eq!(counter.increment(&id("alice")), 1);
        assert_eq!(counter.increment(&id("alice")), 2);
        assert_eq!(counter.count_for(&id("alice")), 2);
    }

    #[test]
    fn test_count_for_absent_is_zero() {
        let counter = RepostCounter::new();
        assert_eq!(counter.count_for(&id("ghost")), 0);
    }

    #[test]
    fn test_ranked_descending() {
        let mut counter = RepostCounter::new();
        counter.increment(&id("alice"));
        for _ in 0..3 {
            counter.increment(&id("bob"));
        }
        for _ in 0..2 {
            counter.increment(&id("carol"));
        }

        let ranked = counter.ranked();
        assert_eq!(
            ranked,
            vec![(id("bob"), 3), (id("carol"), 2), (id("alice"), 1)]
        );
    }

    #[test]
    fn test_ties_break_by_first_charge_order() {
        let mut counter = RepostCounter::new();
        counter.increment(&id("zed"));
        counter.increment(&id("amy"));

        // Equal counts: zed was charged first, so zed ranks first.
        let ranked = counter.ranked();
        assert_eq!(ranked, vec![(id("zed"), 1), (id("amy"), 1)]);
        assert_eq!(counter.rank(&id("zed")), Some((1, 1)));
        assert_eq!(counter.rank(&id("amy")), Some((1, 2)));
    }

    #[test]
    fn test_rank_absent_is_none() {
        let counter = RepostCounter::new();
        assert_eq!(counter.rank(&id("ghost")), None);
    }

    #[test]
    fn test_top_truncates() {
        let mut counter = RepostCounter::new();
        for name in ["a", "b", "c", "d"] {
            counter.increment(&id(name));
        }
        assert_eq!(counter.top(2).len(), 2);
        assert_eq!(counter.top(10).len(), 4);
    }

    #[test]
    fn test_fold_sums_and_removes() {
        let mut counter = RepostCounter::new();
        for _ in 0..2 {
            counter.increment(&id("bob"));
        }
        for _ in 0..3 {
            counter.increment(&id("robert"));
        }

        counter.fold(&id("bob"), &id("robert"));
        assert_eq!(counter.count_for(&id("robert")), 5);
        assert_eq!(counter.count_for(&id("bob")), 0);
        assert_eq!(counter.len(), 1);
    }

    #[test]
    fn test_fold_into_fresh_identity() {
        let mut counter = RepostCounter::new();
        counter.increment(&id("bob"));
        counter.fold(&id("bob"), &id("robert"));
        assert_eq!(counter.count_for(&id("robert")), 1);
    }

    #[test]
    fn test_fold_missing_source_is_noop() {
        let mut counter = RepostCounter::new();
        counter.increment(&id("robert"));
        counter.fold(&id("ghost"), &id("robert"));
        assert_eq!(counter.count_for(&id("robert")), 1);
    }

    #[test]
    fn test_purge_one() {
        let mut counter = RepostCounter::new();
        counter.increment(&id("alice"));
        assert!(counter.purge(&id("alice")));
        assert!(!counter.purge(&id("alice")));
        assert_eq!(counter.count_for(&id("alice")), 0);
    }

    #[test]
    fn test_from_counts_preserves_order_and_skips_zero() {
        let counter = RepostCounter::from_counts(vec![
            (id("zed"), 2),
            (id("amy"), 2),
            (id("nil"), 0),
        ]);
        assert_eq!(counter.len(), 2);
        assert_eq!(counter.ranked(), vec![(id("zed"), 2), (id("amy"), 2)]);
    }
}
