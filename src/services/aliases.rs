//! Alias graph resolution.
//!
//! Maintains a directed mapping `alias -> primary` and resolves any name to
//! its canonical representative. Each node has at most one outbound edge, so
//! the structure is a forest; edges are installed by explicit merges and
//! removed by explicit unmerges.
//!
//! Resolution compresses paths opportunistically: a merge rewrites every
//! edge that pointed at the merged alias to point at the new primary, which
//! keeps lookups short without a rank-based union. The edges themselves are
//! meaningful data (who is an alias of whom), not opaque bookkeeping.

use crate::models::Identity;
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Result of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The canonical identity everything now resolves to.
    pub primary: Identity,
    /// The alias's previous canonical identity, whose history should be
    /// folded into `primary`.
    pub folded: Identity,
}

/// Resolves names to canonical identities through the alias graph.
#[derive(Debug, Clone, Default)]
pub struct AliasResolver {
    /// `alias -> primary` edges. Invariant: following edges from any node
    /// terminates; `merge` refuses to install an edge that would close a
    /// cycle.
    edges: HashMap<Identity, Identity>,
}

impl AliasResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a resolver from persisted edges.
    #[must_use]
    pub fn from_edges(edges: HashMap<Identity, Identity>) -> Self {
        Self { edges }
    }

    /// Resolves a raw name to its canonical identity.
    ///
    /// Case-folds the name, then follows alias edges until a name with no
    /// outbound edge is found. A visited set bounds the walk: if a node is
    /// about to be revisited the graph contains a cycle, which `merge` is
    /// supposed to make impossible — the anomaly is logged and the last name
    /// seen before the revisit is treated as canonical.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Identity {
        self.canonical(&Identity::new(name))
    }

    /// Resolves an already-folded identity to its canonical representative.
    #[must_use]
    pub fn canonical(&self, id: &Identity) -> Identity {
        let mut current = id.clone();
        let mut seen = HashSet::new();
        while let Some(next) = self.edges.get(&current) {
            if !seen.insert(current.clone()) {
                warn!(identity = %id, at = %current, "alias cycle detected during resolution");
                break;
            }
            current = next.clone();
        }
        current
    }

    /// Installs `alias -> primary` and compresses paths through the old
    /// alias target.
    ///
    /// Both names are resolved first; the edge is installed between the
    /// canonical forms, so merging chains of aliases keeps the forest flat.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if either name folds to an empty
    /// string, and [`Error::IdentityConflict`] if the two names already
    /// resolve to the same identity (the only way an edge could close a
    /// cycle).
    pub fn merge(&mut self, primary: &str, alias: &str) -> Result<MergeOutcome> {
        let primary_id = Identity::new(primary);
        let alias_id = Identity::new(alias);
        if primary_id.is_empty() || alias_id.is_empty() {
            return Err(Error::InvalidInput(
                "identity names must be non-empty".to_string(),
            ));
        }

        let p = self.canonical(&primary_id);
        let a = self.canonical(&alias_id);

        if p == a {
            return Err(Error::IdentityConflict {
                primary: primary.to_string(),
                alias: alias.to_string(),
            });
        }

        self.edges.insert(a.clone(), p.clone());

        // Re-point any edge that ended at the old alias target, so
        // resolution stays a single hop after the merge.
        for target in self.edges.values_mut() {
            if *target == a {
                *target = p.clone();
            }
        }

        debug!(alias = %a, primary = %p, "alias edge installed");

        Ok(MergeOutcome {
            primary: p,
            folded: a,
        })
    }

    /// Removes the alias edge for a name.
    ///
    /// The name is case-folded but NOT resolved: only a literal edge keyed
    /// by that name can be removed. History stays attributed to whatever the
    /// alias had already folded into.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no edge exists for the name.
    pub fn unmerge(&mut self, alias: &str) -> Result<Identity> {
        let a = Identity::new(alias);
        self.edges.remove(&a).map_or_else(
            || Err(Error::NotFound(format!("no alias found for '{alias}'"))),
            |primary| {
                debug!(alias = %a, primary = %primary, "alias edge removed");
                Ok(primary)
            },
        )
    }

    /// Returns all alias edges, sorted by alias name.
    #[must_use]
    pub fn edges(&self) -> Vec<(Identity, Identity)> {
        let mut pairs: Vec<_> = self
            .edges
            .iter()
            .map(|(a, p)| (a.clone(), p.clone()))
            .collect();
        pairs.sort_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));
        pairs
    }

    /// Returns the number of alias edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if no aliases are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
