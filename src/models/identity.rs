//! Identity types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A case-folded identity name.
///
/// Two raw names that differ only in letter case construct equal identities.
/// Whether two identities are "the same person" is decided by the alias
/// resolver, which maps identities to their canonical representative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Creates an identity from a raw name, folding case.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_lowercase())
    }

    /// Returns the folded name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the folded name is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Target of a purge operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeTarget {
    /// Purge the repost count of a single identity.
    Identity(Identity),
    /// Purge all repost counts and the entire link ledger.
    All,
}

impl PurgeTarget {
    /// Parses a purge target from raw text; `"all"` (any case) means all.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Identity(Identity::new(raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_folds_case() {
        assert_eq!(Identity::new("Alice"), Identity::new("ALICE"));
        assert_eq!(Identity::new("Alice").as_str(), "alice");
    }

    #[test]
    fn test_identity_trims_whitespace() {
        assert_eq!(Identity::new("  bob "), Identity::new("bob"));
    }

    #[test]
    fn test_identity_display() {
        assert_eq!(Identity::new("Carol").to_string(), "carol");
    }

    #[test]
    fn test_purge_target_parse() {
        assert_eq!(PurgeTarget::parse("all"), PurgeTarget::All);
        assert_eq!(PurgeTarget::parse("ALL"), PurgeTarget::All);
        assert_eq!(
            PurgeTarget::parse("dave"),
            PurgeTarget::Identity(Identity::new("dave"))
        );
    }
}
