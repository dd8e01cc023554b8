//! Durable stores.
//!
//! Three independent JSON files under the data directory, loaded at startup
//! and rewritten after every mutation:
//!
//! | File | Contents |
//! |------|----------|
//! | `counts.json` | identity -> repost count, in first-charge order |
//! | `links.json` | canonical URL -> (poster, posted-at) |
//! | `aliases.json` | alias -> primary edges |
//!
//! Every file is a versioned envelope, so a malformed or partially written
//! store fails parsing predictably instead of being executed or
//! half-interpreted. A store that cannot be read or parsed is treated as
//! empty with a logged warning; startup never fails on corrupt state.
//! Writes go to a sibling `.tmp` file and are renamed into place.

use crate::models::{CanonicalUrl, Identity, LinkEntry};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Current on-disk format version.
const STORE_VERSION: u32 = 1;

/// Serializable counts store.
#[derive(Debug, Serialize, Deserialize)]
struct StoredCounts {
    version: u32,
    /// Order is meaningful: it preserves first-charge order across restarts.
    counts: Vec<StoredCount>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredCount {
    identity: String,
    count: u64,
}

/// Serializable link ledger store.
#[derive(Debug, Serialize, Deserialize)]
struct StoredLinks {
    version: u32,
    links: Vec<StoredLink>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredLink {
    url: String,
    poster: String,
    posted_at: u64,
}

/// Serializable alias map store.
#[derive(Debug, Serialize, Deserialize)]
struct StoredAliases {
    version: u32,
    aliases: Vec<StoredAlias>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredAlias {
    alias: String,
    primary: String,
}

/// The three durable store files.
#[derive(Debug, Clone)]
pub struct StoreSet {
    counts_path: PathBuf,
    links_path: PathBuf,
    aliases_path: PathBuf,
}

impl StoreSet {
    /// Creates a store set rooted at `data_dir`, creating the directory if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir).map_err(|e| Error::OperationFailed {
            operation: "create_data_dir".to_string(),
            cause: e.to_string(),
        })?;

        Ok(Self {
            counts_path: data_dir.join("counts.json"),
            links_path: data_dir.join("links.json"),
            aliases_path: data_dir.join("aliases.json"),
        })
    }

    /// Loads the counts store, in file order.
    ///
    /// Missing, unreadable, or unparseable files load as empty.
    #[must_use]
    pub fn load_counts(&self) -> Vec<(Identity, u64)> {
        let stored: StoredCounts = load_or_default(&self.counts_path, StoredCounts {
            version: STORE_VERSION,
            counts: Vec::new(),
        });
        stored
            .counts
            .into_iter()
            .map(|c| (Identity::new(c.identity), c.count))
            .collect()
    }

    /// Loads the link ledger store.
    #[must_use]
    pub fn load_links(&self) -> Vec<(CanonicalUrl, LinkEntry)> {
        let stored: StoredLinks = load_or_default(&self.links_path, StoredLinks {
            version: STORE_VERSION,
            links: Vec::new(),
        });
        stored
            .links
            .into_iter()
            .map(|l| {
                (
                    CanonicalUrl::new(l.url),
                    LinkEntry {
                        poster: Identity::new(l.poster),
                        posted_at: l.posted_at,
                    },
                )
            })
            .collect()
    }

    /// Loads the alias map store.
    #[must_use]
    pub fn load_aliases(&self) -> HashMap<Identity, Identity> {
        let stored: StoredAliases = load_or_default(&self.aliases_path, StoredAliases {
            version: STORE_VERSION,
            aliases: Vec::new(),
        });
        stored
            .aliases
            .into_iter()
            .map(|a| (Identity::new(a.alias), Identity::new(a.primary)))
            .collect()
    }

    /// Writes the counts store.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn save_counts(&self, counts: &[(Identity, u64)]) -> Result<()> {
        let stored = StoredCounts {
            version: STORE_VERSION,
            counts: counts
                .iter()
                .map(|(identity, count)| StoredCount {
                    identity: identity.as_str().to_string(),
                    count: *count,
                })
                .collect(),
        };
        write_atomically(&self.counts_path, &stored, "save_counts")
    }

    /// Writes the link ledger store.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn save_links(&self, links: &[(CanonicalUrl, LinkEntry)]) -> Result<()> {
        let stored = StoredLinks {
            version: STORE_VERSION,
            links: links
                .iter()
                .map(|(url, entry)| StoredLink {
                    url: url.as_str().to_string(),
                    poster: entry.poster.as_str().to_string(),
                    posted_at: entry.posted_at,
                })
                .collect(),
        };
        write_atomically(&self.links_path, &stored, "save_links")
    }

    /// Writes the alias map store, sorted by alias for stable output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn save_aliases(&self, aliases: &[(Identity, Identity)]) -> Result<()> {
        let stored = StoredAliases {
            version: STORE_VERSION,
            aliases: aliases
                .iter()
                .map(|(alias, primary)| StoredAlias {
                    alias: alias.as_str().to_string(),
                    primary: primary.as_str().to_string(),
                })
                .collect(),
        };
        write_atomically(&self.aliases_path, &stored, "save_aliases")
    }
}

/// Loads a store file, treating any failure as an empty store.
fn load_or_default<T: DeserializeOwned>(path: &Path, default: T) -> T {
    if !path.exists() {
        debug!(path = %path.display(), "store file absent, starting empty");
        return default;
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable store, starting empty");
            return default;
        }
    };

    match serde_json::from_str(&contents) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt store, starting empty");
            default
        }
    }
}

/// Serializes `value` to a temp file next to `path`, then renames it in.
fn write_atomically<T: Serialize>(path: &Path, value: &T, operation: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    })?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json).map_err(|e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    })?;
    fs::rename(&tmp_path, path).map_err(|e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, StoreSet) {
        let dir = TempDir::new().expect("temp dir");
        let store = StoreSet::open(dir.path()).expect("store set");
        (dir, store)
    }

    #[test]
    fn test_missing_files_load_empty() {
        let (_dir, store) = store();
        assert!(store.load_counts().is_empty());
        assert!(store.load_links().is_empty());
        assert!(store.load_aliases().is_empty());
    }

    #[test]
    fn test_counts_round_trip_preserves_order() {
        let (_dir, store) = store();
        let counts = vec![
            (Identity::new("zed"), 3),
            (Identity::new("amy"), 3),
            (Identity::new("bob"), 1),
        ];
        store.save_counts(&counts).expect("save");
        assert_eq!(store.load_counts(), counts);
    }

    #[test]
    fn test_links_round_trip() {
        let (_dir, store) = store();
        let links = vec![(
            CanonicalUrl::new("http://example.com/a"),
            LinkEntry {
                poster: Identity::new("alice"),
                posted_at: 1000,
            },
        )];
        store.save_links(&links).expect("save");
        assert_eq!(store.load_links(), links);
    }

    #[test]
    fn test_aliases_round_trip() {
        let (_dir, store) = store();
        let aliases = vec![(Identity::new("bob"), Identity::new("robert"))];
        store.save_aliases(&aliases).expect("save");
        let loaded = store.load_aliases();
        assert_eq!(
            loaded.get(&Identity::new("bob")),
            Some(&Identity::new("robert"))
        );
    }

    #[test]
    fn test_corrupt_store_loads_empty() {
        let (dir, store) = store();
        fs::write(dir.path().join("counts.json"), "{not json").expect("write");
        assert!(store.load_counts().is_empty());
    }

    #[test]
    fn test_wrong_shape_loads_empty() {
        let (dir, store) = store();
        fs::write(dir.path().join("links.json"), r#"{"version": 1}"#).expect("write");
        assert!(store.load_links().is_empty());
    }
}
