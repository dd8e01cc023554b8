//! Engine façade.
//!
//! [`RepostEngine`] owns all mutable state — the alias graph, the link
//! ledger, and the repost counter — behind a single lock, and composes the
//! leaf services to answer "was this a repost, and by/against whom".
//!
//! # Concurrency
//!
//! Mutating operations (`observe`, `merge_alias`, `unmerge_alias`, `purge`)
//! take the write lock for the whole evict-lookup-write sequence, so a
//! repost check and the increment it causes are atomic with respect to
//! concurrent observations of the same URL. Read-only queries take the read
//! lock and never see a torn intermediate state. The host may call from
//! multiple threads; a poisoned lock is recovered, since every mutation is
//! followed by a durability write and the stores tolerate replay.
//!
//! # Durability
//!
//! After each mutation the affected stores are snapshotted while the lock is
//! held and written to disk after it is released, so slow I/O never blocks
//! other callers. A failed write is logged and does not undo the applied
//! mutation; the window of inconsistency on crash is at most one operation.

use crate::config::EngineConfig;
use crate::models::{CanonicalUrl, Identity, LinkEntry, ObserveOutcome, PurgeTarget};
use crate::services::{AliasResolver, LinkLedger, RepostCounter, UrlCanonicalizer};
use crate::storage::StoreSet;
use crate::{Error, Result};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

/// Summary statistics for the status surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Links currently tracked by the ledger (including not-yet-swept
    /// expired entries).
    pub tracked_links: usize,
    /// Identities with a non-zero repost count.
    pub counted_identities: usize,
    /// Alias edges configured.
    pub alias_edges: usize,
    /// Sum of all repost counts.
    pub total_reposts: u64,
}

/// Mutable engine state, guarded by a single lock.
struct EngineState {
    aliases: AliasResolver,
    ledger: LinkLedger,
    counter: RepostCounter,
}

/// Pending store snapshots, written after the lock is released.
#[derive(Default)]
struct Pending {
    counts: Option<Vec<(Identity, u64)>>,
    links: Option<Vec<(CanonicalUrl, LinkEntry)>>,
    aliases: Option<Vec<(Identity, Identity)>>,
}

/// The repost detection and identity resolution engine.
pub struct RepostEngine {
    canonicalizer: UrlCanonicalizer,
    leaderboard_limit: usize,
    store: StoreSet,
    state: RwLock<EngineState>,
}

impl RepostEngine {
    /// Opens an engine, loading the three durable stores.
    ///
    /// Counts are re-folded through the alias map at load, so per-alias
    /// counts recorded before a merge consolidate into the canonical
    /// identity. Missing or corrupt stores load as empty.
    ///
    /// # Errors
    ///
    /// Returns an error only if the data directory cannot be created.
    pub fn open(config: EngineConfig) -> Result<Self> {
        let store = StoreSet::open(&config.data_dir)?;

        let aliases = AliasResolver::from_edges(store.load_aliases());

        // Load-time reconciliation: resolve every stored identity before
        // counting, summing entries that fold to the same canonical form.
        let counter = RepostCounter::from_counts(
            store
                .load_counts()
                .into_iter()
                .map(|(identity, count)| (aliases.canonical(&identity), count)),
        );

        let ledger =
            LinkLedger::from_entries(config.ledger_capacity, config.ttl_secs, store.load_links());

        info!(
            tracked_links = ledger.len(),
            counted_identities = counter.len(),
            alias_edges = aliases.len(),
            "engine opened"
        );

        Ok(Self {
            canonicalizer: UrlCanonicalizer::new(&config.ignore_params_domains),
            leaderboard_limit: config.leaderboard_limit,
            store,
            state: RwLock::new(EngineState {
                aliases,
                ledger,
                counter,
            }),
        })
    }

    /// Observes a link share and classifies it.
    ///
    /// Canonicalizes the URL, sweeps expired ledger entries, and compares
    /// the sender's resolved identity against the recorded poster's:
    ///
    /// - unknown URL: record it, [`ObserveOutcome::Fresh`];
    /// - same resolved identity: refresh the timestamp,
    ///   [`ObserveOutcome::SamePoster`];
    /// - different resolved identity: charge the repost to the sender and
    ///   leave the original entry untouched, so later reposts still
    ///   reference the true original.
    ///
    /// Total function: malformed URLs degrade inside the canonicalizer and
    /// a failed durability write is logged rather than surfaced.
    pub fn observe(&self, raw_url: &str, sender: &str, now: u64) -> ObserveOutcome {
        let canonical = self.canonicalizer.canonicalize(raw_url);
        let sender = Identity::new(sender);

        let (outcome, pending) = {
            let mut guard = self.write_state();
            let state = &mut *guard;

            let evicted = state.ledger.evict_expired(now);
            let sender_resolved = state.aliases.canonical(&sender);

            let existing = state.ledger.peek(&canonical).cloned();
            let mut pending = Pending::default();

            let outcome = match existing {
                None => {
                    state.ledger.record(canonical, sender, now);
                    pending.links = Some(snapshot_links(&state.ledger));
                    ObserveOutcome::Fresh
                }
                Some(entry) if state.aliases.canonical(&entry.poster) == sender_resolved => {
                    // Same identity re-sharing its own link extends the
                    // window; nothing is charged.
                    state.ledger.record(canonical, sender, now);
                    pending.links = Some(snapshot_links(&state.ledger));
                    ObserveOutcome::SamePoster
                }
                Some(entry) => {
                    let count = state.counter.increment(&sender_resolved);
                    let elapsed_secs = now.saturating_sub(entry.posted_at);
                    info!(
                        url = %canonical,
                        reposter = %sender_resolved,
                        original_poster = %entry.poster,
                        elapsed_secs,
                        count,
                        "repost detected"
                    );
                    pending.counts = Some(state.counter.entries());
                    if evicted > 0 {
                        pending.links = Some(snapshot_links(&state.ledger));
                    }
                    ObserveOutcome::Repost {
                        original_poster: entry.poster,
                        posted_at: entry.posted_at,
                        elapsed_secs,
                        count,
                    }
                }
            };

            (outcome, pending)
        };

        let label = match &outcome {
            ObserveOutcome::Fresh => "fresh",
            ObserveOutcome::SamePoster => "same_poster",
            ObserveOutcome::Repost { .. } => "repost",
        };
        metrics::counter!("dejavu_observe_total", "outcome" => label).increment(1);

        self.persist(pending);
        outcome
    }

    /// Merges `alias` into `primary` and folds the alias's repost history
    /// into the primary's count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdentityConflict`] if the two names already resolve
    /// to the same identity, or [`Error::InvalidInput`] for empty names.
    /// State is unchanged on error and repeated calls fail identically.
    pub fn merge_alias(&self, primary: &str, alias: &str) -> Result<()> {
        let pending = {
            let mut guard = self.write_state();
            let state = &mut *guard;

            let outcome = state.aliases.merge(primary, alias)?;
            state.counter.fold(&outcome.folded, &outcome.primary);
            info!(alias = %outcome.folded, primary = %outcome.primary, "identities merged");

            Pending {
                counts: Some(state.counter.entries()),
                aliases: Some(state.aliases.edges()),
                links: None,
            }
        };

        self.persist(pending);
        Ok(())
    }

    /// Removes the alias edge for a name.
    ///
    /// Counts are NOT split back out: history stays attributed to whatever
    /// the alias had already folded into. Only the structural edge is
    /// undone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no alias edge exists for the name.
    pub fn unmerge_alias(&self, alias: &str) -> Result<()> {
        let pending = {
            let mut guard = self.write_state();
            let state = &mut *guard;

            let primary = state.aliases.unmerge(alias)?;
            info!(alias = alias, primary = %primary, "alias removed");

            Pending {
                aliases: Some(state.aliases.edges()),
                counts: None,
                links: None,
            }
        };

        self.persist(pending);
        Ok(())
    }

    /// Purges one identity's repost count, or all counts and the ledger.
    ///
    /// The alias map is never purged; it is administrative structure, not
    /// history.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when purging a single identity that has
    /// no repost count.
    pub fn purge(&self, target: &PurgeTarget) -> Result<()> {
        let pending = {
            let mut guard = self.write_state();
            let state = &mut *guard;

            match target {
                PurgeTarget::All => {
                    state.counter.clear();
                    state.ledger.clear();
                    info!("all repost data purged");
                    Pending {
                        counts: Some(state.counter.entries()),
                        links: Some(snapshot_links(&state.ledger)),
                        aliases: None,
                    }
                }
                PurgeTarget::Identity(identity) => {
                    let resolved = state.aliases.canonical(identity);
                    if !state.counter.purge(&resolved) {
                        return Err(Error::NotFound(format!(
                            "no repost data found for '{identity}'"
                        )));
                    }
                    info!(identity = %resolved, "repost count purged");
                    Pending {
                        counts: Some(state.counter.entries()),
                        links: None,
                        aliases: None,
                    }
                }
            }
        };

        self.persist(pending);
        Ok(())
    }

    /// Returns the top reposters, descending by count.
    ///
    /// `limit` defaults to the configured leaderboard length.
    #[must_use]
    pub fn leaderboard(&self, limit: Option<usize>) -> Vec<(Identity, u64)> {
        let state = self.read_state();
        state.counter.top(limit.unwrap_or(self.leaderboard_limit))
    }

    /// Returns an identity's `(count, rank)`; rank is `None` when the
    /// identity has no reposts.
    #[must_use]
    pub fn repost_count_for(&self, name: &str) -> (u64, Option<usize>) {
        let state = self.read_state();
        let resolved = state.aliases.resolve(name);
        state
            .counter
            .rank(&resolved)
            .map_or((0, None), |(count, rank)| (count, Some(rank)))
    }

    /// Returns all alias edges, sorted by alias name.
    #[must_use]
    pub fn aliases(&self) -> Vec<(Identity, Identity)> {
        self.read_state().aliases.edges()
    }

    /// Returns summary statistics.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        let state = self.read_state();
        EngineStats {
            tracked_links: state.ledger.len(),
            counted_identities: state.counter.len(),
            alias_edges: state.aliases.len(),
            total_reposts: state.counter.entries().iter().map(|(_, c)| *c).sum(),
        }
    }

    /// Writes all three stores.
    ///
    /// Every mutation already persists the stores it touched; this is the
    /// explicit teardown hook for embedding applications.
    ///
    /// # Errors
    ///
    /// Returns the first store write error encountered.
    pub fn flush(&self) -> Result<()> {
        let (counts, links, aliases) = {
            let state = self.read_state();
            (
                state.counter.entries(),
                snapshot_links(&state.ledger),
                state.aliases.edges(),
            )
        };
        self.store.save_counts(&counts)?;
        self.store.save_links(&links)?;
        self.store.save_aliases(&aliases)
    }

    /// Writes pending snapshots, logging failures instead of surfacing
    /// them; the in-memory mutation has already been applied.
    fn persist(&self, pending: Pending) {
        if let Some(counts) = pending.counts {
            if let Err(e) = self.store.save_counts(&counts) {
                warn!(error = %e, "failed to persist counts store");
            }
        }
        if let Some(links) = pending.links {
            if let Err(e) = self.store.save_links(&links) {
                warn!(error = %e, "failed to persist links store");
            }
        }
        if let Some(aliases) = pending.aliases {
            if let Err(e) = self.store.save_aliases(&aliases) {
                warn!(error = %e, "failed to persist aliases store");
            }
        }
    }

    /// Acquires the read lock, recovering from poisoning.
    fn read_state(&self) -> RwLockReadGuard<'_, EngineState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquires the write lock, recovering from poisoning.
    fn write_state(&self) -> RwLockWriteGuard<'_, EngineState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Snapshots the ledger for persistence.
fn snapshot_links(ledger: &LinkLedger) -> Vec<(CanonicalUrl, LinkEntry)> {
    ledger
        .iter()
        .map(|(url, entry)| (url.clone(), entry.clone()))
        .collect()
}
