//! Engine services.
//!
//! Leaf components (canonicalizer, alias resolver, ledger, counter) and the
//! [`RepostEngine`] façade that composes them.

mod aliases;
mod canonical;
mod counter;
mod engine;
mod ledger;

pub use aliases::{AliasResolver, MergeOutcome};
pub use canonical::UrlCanonicalizer;
pub use counter::RepostCounter;
pub use engine::{EngineStats, RepostEngine};
pub use ledger::LinkLedger;
