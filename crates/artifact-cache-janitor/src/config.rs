//! Janitor configuration from environment variables

use artifact_lru_cache::{CacheConfig, SizeAccounting};
use std::env;
use std::path::PathBuf;
use tracing::warn;

/// Configuration for a janitor run
#[derive(Debug, Clone)]
pub struct JanitorConfig {
    pub cache: CacheConfig,
    /// Drop entries whose files are missing before enforcing the budget
    pub verify: bool,
}

impl JanitorConfig {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = CacheConfig::default();

        let base_directory = lookup("CACHE_DIR").map(PathBuf::from);

        let state_path = lookup("CACHE_STATE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.state_path);

        // Zero or unparseable means unbounded
        let max_bytes = lookup("MAX_CACHE_SIZE")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|&bytes| bytes > 0);

        let extension = lookup("CACHE_EXTENSION")
            .map(|s| s.trim_start_matches('.').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.extension);

        let size_accounting = match lookup("CACHE_SIZE_ACCOUNTING") {
            Some(mode) => mode.parse::<SizeAccounting>().unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to directory walk size accounting");
                SizeAccounting::default()
            }),
            None => SizeAccounting::default(),
        };

        let verify = lookup("CACHE_VERIFY")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            cache: CacheConfig {
                base_directory,
                max_bytes,
                state_path,
                extension,
                size_accounting,
                autosave: defaults.autosave,
            },
            verify,
        }
    }
}
