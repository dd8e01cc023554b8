//! Configuration management.

use serde::Deserialize;
use std::path::PathBuf;

/// Default observation window: 12 hours.
pub const DEFAULT_TTL_SECS: u64 = 12 * 3600;

/// Default upper bound on tracked links.
pub const DEFAULT_LEDGER_CAPACITY: usize = 10_000;

/// Default leaderboard length.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 15;

/// Domains whose query parameters are volatile per-view tokens and must be
/// ignored when comparing links. All other domains keep their query strings,
/// since parameters there usually identify content (pagination, IDs).
pub const DEFAULT_IGNORE_PARAMS_DOMAINS: &[&str] =
    &["twitter.com", "x.com", "twimg.com", "nytimes.com"];

/// Main configuration for the repost engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding the three durable stores.
    pub data_dir: PathBuf,
    /// Observation window in seconds; ledger entries older than this are
    /// evicted before any lookup.
    pub ttl_secs: u64,
    /// Maximum number of links tracked at once.
    pub ledger_capacity: usize,
    /// Default number of leaderboard entries returned.
    pub leaderboard_limit: usize,
    /// Domains whose query strings are dropped during canonicalization.
    pub ignore_params_domains: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            ttl_secs: DEFAULT_TTL_SECS,
            ledger_capacity: DEFAULT_LEDGER_CAPACITY,
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
            ignore_params_domains: DEFAULT_IGNORE_PARAMS_DOMAINS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Platform data directory for the stores, falling back to `.dejavu`.
fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "zircote", "dejavu").map_or_else(
        || PathBuf::from(".dejavu"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Observation window in seconds.
    pub ttl_secs: Option<u64>,
    /// Ledger capacity.
    pub ledger_capacity: Option<usize>,
    /// Leaderboard length.
    pub leaderboard_limit: Option<usize>,
    /// Domains whose query strings are ignored.
    pub ignore_params_domains: Option<Vec<String>>,
}

impl EngineConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &std::path::Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: e.to_string(),
            })?;

        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/dejavu/` on macOS)
    /// 2. XDG config dir (`~/.config/dejavu/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs.config_dir().join("dejavu").join("config.toml");
        if platform_config.exists() {
            if let Ok(config) = Self::load_from_file(&platform_config) {
                return config;
            }
        }

        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("dejavu")
            .join("config.toml");
        if xdg_config.exists() {
            if let Ok(config) = Self::load_from_file(&xdg_config) {
                return config;
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to an `EngineConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(ttl_secs) = file.ttl_secs {
            config.ttl_secs = ttl_secs;
        }
        if let Some(capacity) = file.ledger_capacity {
            config.ledger_capacity = capacity.max(1);
        }
        if let Some(limit) = file.leaderboard_limit {
            config.leaderboard_limit = limit;
        }
        if let Some(domains) = file.ignore_params_domains {
            config.ignore_params_domains = domains;
        }

        config
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Sets the observation window in seconds.
    #[must_use]
    pub const fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Sets the ledger capacity (minimum 1).
    #[must_use]
    pub fn with_ledger_capacity(mut self, capacity: usize) -> Self {
        self.ledger_capacity = capacity.max(1);
        self
    }
}
