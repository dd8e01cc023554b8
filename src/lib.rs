//! # Dejavu
//!
//! Repost detection and identity resolution engine for chat channels.
//!
//! Dejavu tracks which links have been shared recently, notices when a link
//! is shared again within the observation window, and charges the repost to
//! a durable identity even when that identity posts under multiple aliases.
//!
//! ## Features
//!
//! - URL canonicalization with per-domain query-parameter policies
//! - Alias graph with path compression (merge/unmerge of identities)
//! - Time-windowed link ledger (12-hour default, swept on access)
//! - Ranked repost counts with a stable leaderboard
//! - Three versioned JSON stores, loaded at startup and written after
//!   every mutation
//!
//! ## Example
//!
//! ```rust,ignore
//! use dejavu::{EngineConfig, ObserveOutcome, RepostEngine, current_timestamp};
//!
//! let engine = RepostEngine::open(EngineConfig::default())?;
//! match engine.observe("https://x.com/some/post?s=20", "alice", current_timestamp()) {
//!     ObserveOutcome::Fresh => {}
//!     ObserveOutcome::SamePoster => {}
//!     ObserveOutcome::Repost { original_poster, .. } => {
//!         println!("already posted by {original_poster}");
//!     }
//! }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cli;
pub mod config;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::EngineConfig;
pub use models::{CanonicalUrl, Identity, LinkEntry, ObserveOutcome, PurgeTarget};
pub use services::{AliasResolver, LinkLedger, RepostCounter, RepostEngine, UrlCanonicalizer};

/// Error type for dejavu operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Empty identity names, blank purge targets |
/// | `IdentityConflict` | Merging two names that already resolve to the same identity |
/// | `NotFound` | Unmerging a name with no alias edge, purging an uncounted identity |
/// | `OperationFailed` | Store I/O errors, serialization failures |
///
/// Malformed URLs never raise an error: the canonicalizer degrades to a
/// best-effort form. Corrupt persisted stores are recovered as empty at load
/// time with a logged warning.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A merge was requested between names that are already the same identity.
    ///
    /// The merge is rejected and no state changes. Repeating the call fails
    /// the same way.
    #[error("'{alias}' already resolves to the same identity as '{primary}'")]
    IdentityConflict {
        /// The requested primary name.
        primary: String,
        /// The requested alias name.
        alias: String,
    },

    /// The named alias or identity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - A durable store cannot be written
    /// - Serialization of a store snapshot fails
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for dejavu operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Centralized so that the engine, CLI, and tests agree on the clock. Falls
/// back to 0 if the system clock is before the Unix epoch.
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
