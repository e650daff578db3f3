//! LRU eviction against a byte budget

use crate::path::resolve_path;
use crate::recency::RecencyList;
use crate::size::file_size;
use crate::types::ArtifactId;
use serde::Serialize;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// An artifact removed from the cache by eviction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvictedArtifact<K> {
    pub id: K,
    pub path: PathBuf,
    pub bytes_freed: u64,
    /// The file was already gone when eviction reached it
    pub already_absent: bool,
}

/// An artifact dropped from the recency list whose file could not be deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvictionFailure<K> {
    pub id: K,
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of one eviction pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvictionReport<K> {
    pub budget: u64,
    /// Bytes occupied after the pass
    pub total_bytes: u64,
    pub evicted: Vec<EvictedArtifact<K>>,
    pub failures: Vec<EvictionFailure<K>>,
    /// The recency list ran dry while still over budget
    pub budget_unsatisfied: bool,
}

impl<K> EvictionReport<K> {
    pub fn is_noop(&self) -> bool {
        self.evicted.is_empty() && self.failures.is_empty()
    }
}

/// Pop least-recently-used artifacts and delete their files until
/// `total_bytes` fits in `budget` or the list is empty.
///
/// Sizes are measured right before deletion and subtracted from the running
/// total, so the directory is not walked again inside the loop. Failed
/// deletions are recorded and the pass moves on to the next candidate.
///
/// When `recorded_sizes` is given (incremental accounting), the recorded
/// size of each popped artifact is what leaves the total, including for
/// files that were already deleted out-of-band. Popped ids are removed
/// from the map.
pub(crate) async fn evict_to_budget<K: ArtifactId>(
    recency: &mut RecencyList<K>,
    mut recorded_sizes: Option<&mut HashMap<K, u64>>,
    base_dir: &Path,
    extension: &str,
    budget: u64,
    total_bytes: u64,
) -> EvictionReport<K> {
    let mut report = EvictionReport {
        budget,
        total_bytes,
        evicted: Vec::new(),
        failures: Vec::new(),
        budget_unsatisfied: false,
    };

    while report.total_bytes > budget {
        let Some(id) = recency.pop_least_recent() else {
            warn!(
                total_bytes = report.total_bytes,
                budget, "Cache is empty but still over budget"
            );
            report.budget_unsatisfied = true;
            break;
        };

        let path = resolve_path(base_dir, &id, extension);
        let recorded = recorded_sizes.as_mut().and_then(|sizes| sizes.remove(&id));
        info!(id = %id, path = ?path, "Evicting least recently used artifact");

        let Some(size) = file_size(&path).await else {
            report.total_bytes = report.total_bytes.saturating_sub(recorded.unwrap_or(0));
            warn!(id = %id, path = ?path, "Evicted artifact file was already absent");
            report.evicted.push(EvictedArtifact {
                id,
                path,
                bytes_freed: 0,
                already_absent: true,
            });
            continue;
        };

        match fs::remove_file(&path).await {
            Ok(()) => {
                report.total_bytes = report.total_bytes.saturating_sub(recorded.unwrap_or(size));
                info!(id = %id, bytes = size, total_bytes = report.total_bytes, "Deleted artifact file");
                report.evicted.push(EvictedArtifact {
                    id,
                    path,
                    bytes_freed: size,
                    already_absent: false,
                });
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                report.total_bytes = report.total_bytes.saturating_sub(recorded.unwrap_or(size));
                warn!(id = %id, path = ?path, "Evicted artifact file vanished before deletion");
                report.evicted.push(EvictedArtifact {
                    id,
                    path,
                    bytes_freed: 0,
                    already_absent: true,
                });
            }
            Err(e) => {
                warn!(id = %id, path = ?path, error = %e, "Failed to delete evicted artifact");
                report.failures.push(EvictionFailure {
                    id,
                    path,
                    error: e.to_string(),
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, id: u64, bytes: &[u8]) {
        std::fs::write(resolve_path(dir, &id, "zip"), bytes).unwrap();
    }

    #[tokio::test]
    async fn test_under_budget_is_noop() {
        let dir = tempdir().unwrap();
        write(dir.path(), 1, b"12345");
        let mut recency = RecencyList::from_ordered(vec![1u64]);

        let report = evict_to_budget(&mut recency, None, dir.path(), "zip", 10, 5).await;

        assert!(report.is_noop());
        assert!(!report.budget_unsatisfied);
        assert_eq!(recency.len(), 1);
    }

    #[tokio::test]
    async fn test_evicts_least_recent_until_within_budget() {
        let dir = tempdir().unwrap();
        for id in 1..=4u64 {
            write(dir.path(), id, b"0123456789");
        }
        // 4 is most recent, 1 least recent
        let mut recency = RecencyList::from_ordered(vec![4u64, 3, 2, 1]);

        let report = evict_to_budget(&mut recency, None, dir.path(), "zip", 25, 40).await;

        let evicted: Vec<u64> = report.evicted.iter().map(|e| e.id).collect();
        assert_eq!(evicted, vec![1, 2]);
        assert_eq!(report.total_bytes, 20);
        assert_eq!(recency.snapshot(), vec![4, 3]);
        assert!(!resolve_path(dir.path(), &1u64, "zip").exists());
        assert!(!resolve_path(dir.path(), &2u64, "zip").exists());
        assert!(resolve_path(dir.path(), &3u64, "zip").exists());
    }

    #[tokio::test]
    async fn test_missing_file_is_reported_as_absent() {
        let dir = tempdir().unwrap();
        write(dir.path(), 2, b"0123456789");
        let mut recency = RecencyList::from_ordered(vec![2u64, 1]);

        let report = evict_to_budget(&mut recency, None, dir.path(), "zip", 5, 10).await;

        assert_eq!(report.evicted.len(), 2);
        assert!(report.evicted[0].already_absent);
        assert_eq!(report.evicted[0].id, 1);
        assert!(!report.evicted[1].already_absent);
        assert_eq!(report.evicted[1].bytes_freed, 10);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn test_budget_unsatisfiable_when_list_runs_dry() {
        let dir = tempdir().unwrap();
        // Bytes in the directory that the cache does not own
        std::fs::write(dir.path().join("foreign.bin"), vec![0u8; 50]).unwrap();
        write(dir.path(), 1, b"0123456789");
        let mut recency = RecencyList::from_ordered(vec![1u64]);

        let report = evict_to_budget(&mut recency, None, dir.path(), "zip", 20, 60).await;

        assert!(report.budget_unsatisfied);
        assert_eq!(report.total_bytes, 50);
        assert!(recency.is_empty());
    }

    #[tokio::test]
    async fn test_recorded_size_of_absent_file_leaves_total() {
        let dir = tempdir().unwrap();
        write(dir.path(), 2, b"0123456789");
        write(dir.path(), 3, b"0123456789");
        // 1 was measured at 10 bytes, then deleted out-of-band
        let mut recency = RecencyList::from_ordered(vec![3u64, 2, 1]);
        let mut sizes = HashMap::from([(1u64, 10u64), (2, 10), (3, 10)]);

        let report =
            evict_to_budget(&mut recency, Some(&mut sizes), dir.path(), "zip", 25, 30).await;

        let evicted: Vec<u64> = report.evicted.iter().map(|e| e.id).collect();
        assert_eq!(evicted, vec![1]);
        assert!(report.evicted[0].already_absent);
        assert_eq!(report.total_bytes, 20);
        assert_eq!(recency.snapshot(), vec![3, 2]);
        assert!(!sizes.contains_key(&1));
        assert!(resolve_path(dir.path(), &2u64, "zip").exists());
    }
}
