//! Cache types

use crate::eviction::EvictionReport;
use crate::size::SizeAccounting;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::path::PathBuf;

/// Directory used for a fresh cache when neither config nor snapshot names one
pub const DEFAULT_BASE_DIRECTORY: &str = "mapfolder";
/// Snapshot file used when none is configured
pub const DEFAULT_STATE_PATH: &str = "beatmap_data.json";
pub const DEFAULT_EXTENSION: &str = "zip";

/// An opaque token naming one cached artifact file.
///
/// Implemented for every type that can be hashed, displayed (to build its
/// file name) and stored in the JSON snapshot.
pub trait ArtifactId:
    Clone + Eq + Hash + Display + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> ArtifactId for T where
    T: Clone + Eq + Hash + Display + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Configuration for opening an artifact cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Startup override for the base directory. Takes precedence over the
    /// directory recorded in the snapshot.
    pub base_directory: Option<PathBuf>,
    /// Byte budget for the base directory. `None` means unbounded.
    pub max_bytes: Option<u64>,
    pub state_path: PathBuf,
    pub extension: String,
    pub size_accounting: SizeAccounting,
    /// Rewrite the snapshot after every mutating operation
    pub autosave: bool,
}

impl CacheConfig {
    /// Budget with zero normalized to unbounded
    pub fn budget(&self) -> Option<u64> {
        self.max_bytes.filter(|&bytes| bytes > 0)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            base_directory: None,
            max_bytes: None,
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            extension: DEFAULT_EXTENSION.to_string(),
            size_accounting: SizeAccounting::default(),
            autosave: true,
        }
    }
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: u64,
    pub max_bytes: Option<u64>,
}

/// Result of reserving a location for an artifact
#[derive(Debug, Clone)]
pub struct Reservation<K> {
    pub path: PathBuf,
    /// `false` when the id was already known
    pub admitted: bool,
    /// Present when admission ran the eviction policy
    pub eviction: Option<EvictionReport<K>>,
}

/// Outcome of touching an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Touched {
    Promoted,
    /// The id is not in the cache; nothing changed
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.base_directory, None);
        assert_eq!(config.max_bytes, None);
        assert_eq!(config.state_path, PathBuf::from("beatmap_data.json"));
        assert_eq!(config.extension, "zip");
        assert_eq!(config.size_accounting, SizeAccounting::DirectoryWalk);
        assert!(config.autosave);
    }

    #[test]
    fn test_defaults_match_existing_deployments() {
        assert_eq!(DEFAULT_BASE_DIRECTORY, "mapfolder");
        assert_eq!(DEFAULT_STATE_PATH, "beatmap_data.json");
    }

    #[test]
    fn test_zero_budget_is_unbounded() {
        let config = CacheConfig {
            max_bytes: Some(0),
            ..Default::default()
        };
        assert_eq!(config.budget(), None);

        let config = CacheConfig {
            max_bytes: Some(5000 * 1024 * 1024),
            ..Default::default()
        };
        assert_eq!(config.budget(), Some(5000 * 1024 * 1024));
    }

    #[test]
    fn test_cache_stats_serialization() {
        let stats = CacheStats {
            entries: 3,
            total_bytes: 12345,
            max_bytes: None,
        };

        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("12345"));
        assert!(json.contains("\"max_bytes\":null"));
    }
}
