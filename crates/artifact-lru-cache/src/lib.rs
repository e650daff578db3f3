//! Disk-backed artifact cache with LRU eviction
//!
//! Keeps downloaded artifact files under a base directory, bounded by an
//! optional byte budget. The least-recently-used artifact is deleted first
//! when the budget is exceeded, and the recency order is persisted to a
//! JSON snapshot so the cache survives restarts.

mod cache;
mod error;
mod eviction;
mod path;
mod recency;
mod size;
mod store;
mod types;

pub use cache::ArtifactCache;
pub use error::{CacheError, Result};
pub use eviction::{EvictedArtifact, EvictionFailure, EvictionReport};
pub use path::resolve_path;
pub use recency::RecencyList;
pub use size::{directory_size, SizeAccounting};
pub use store::{load_snapshot, save_snapshot, Loaded, Snapshot};
pub use types::{
    ArtifactId, CacheConfig, CacheStats, Reservation, Touched, DEFAULT_BASE_DIRECTORY,
    DEFAULT_EXTENSION, DEFAULT_STATE_PATH,
};
