use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::lookup::error::ConfigError;
use crate::lookup::traversal::ResolveOptions;

// =============================================================================
// Defaults
// =============================================================================

/// Default metadata cache expiry in milliseconds (12 hours)
pub const DEFAULT_CACHE_EXPIRY_MS: i64 = 12 * 60 * 60 * 1000;

/// Default traversal deadline in milliseconds (30 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Dependencies whose ancestry reaches this length are not expanded
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Default base URL for npm registry
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Lookup configuration, read from a JSON file
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LookupConfig {
    pub registry_url: String,
    pub max_depth: usize,
    /// Traversal deadline in milliseconds
    pub timeout_ms: u64,
    pub cache: CacheConfig,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            cache: CacheConfig::default(),
        }
    }
}

impl LookupConfig {
    /// Read a config file; missing fields take their defaults and a negative
    /// cache expiry is clamped to 0
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)?;
        config.cache.expiry = config.cache.expiry.max(0);
        Ok(config)
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            max_depth: self.max_depth,
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

/// Cache-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Entry lifetime in milliseconds
    pub expiry: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            expiry: DEFAULT_CACHE_EXPIRY_MS,
        }
    }
}

/// Returns the path to the data directory for dep-lookup.
/// Uses $XDG_DATA_HOME/dep-lookup if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/dep-lookup,
/// or ./dep-lookup if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("dep-lookup.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    xdg_data_home
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dep-lookup")
}
