//! Link ledger types and observation outcomes.

use super::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalized URL used as the comparison key for repost detection.
///
/// Equal canonical URLs are considered the same resource. Construction goes
/// through [`crate::services::UrlCanonicalizer`]; this type only carries the
/// result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    /// Wraps an already-normalized URL string.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Returns the canonical form as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A ledger entry: who last posted a link, and when.
///
/// Owned exclusively by the link ledger. Overwritten when the same identity
/// re-shares its own link; left untouched when a different identity reposts,
/// so later reposts still reference the true original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    /// The identity that posted the link.
    pub poster: Identity,
    /// When the link was posted (Unix epoch seconds).
    pub posted_at: u64,
}

/// Classification of an observed link share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserveOutcome {
    /// The link was not in the ledger (or its entry had expired).
    Fresh,
    /// The link is in the ledger and the sender resolves to the original
    /// poster; the window was extended, nothing is charged.
    SamePoster,
    /// The link was already posted by a different identity within the window.
    Repost {
        /// The identity that originally posted the link.
        original_poster: Identity,
        /// When the original post happened (Unix epoch seconds).
        posted_at: u64,
        /// Seconds elapsed between the original post and this one.
        elapsed_secs: u64,
        /// The reposter's new total after this repost was charged.
        count: u64,
    },
}

impl ObserveOutcome {
    /// Returns `true` for the repost variant.
    #[must_use]
    pub const fn is_repost(&self) -> bool {
        matches!(self, Self::Repost { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_url_round_trip() {
        let url = CanonicalUrl::new("http://example.com/a");
        assert_eq!(url.as_str(), "http://example.com/a");
        assert_eq!(url.to_string(), "http://example.com/a");
    }

    #[test]
    fn test_outcome_is_repost() {
        assert!(!ObserveOutcome::Fresh.is_repost());
        assert!(!ObserveOutcome::SamePoster.is_repost());
        let repost = ObserveOutcome::Repost {
            original_poster: Identity::new("alice"),
            posted_at: 100,
            elapsed_secs: 10,
            count: 1,
        };
        assert!(repost.is_repost());
    }
}
