//! Disk-backed artifact cache with LRU eviction and a persisted recency list

use crate::error::Result;
use crate::eviction::{evict_to_budget, EvictionReport};
use crate::path::resolve_path;
use crate::recency::RecencyList;
use crate::size::{file_size, measure_directory, SizeAccounting};
use crate::store::{load_snapshot, save_snapshot, Loaded, Snapshot};
use crate::types::{
    ArtifactId, CacheConfig, CacheStats, Reservation, Touched, DEFAULT_BASE_DIRECTORY,
};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// A size-bounded cache of artifact files.
///
/// Every operation holds one lock for its whole sequence (admission,
/// eviction and snapshot write), so the cache can be shared between tasks
/// behind an `Arc`.
pub struct ArtifactCache<K: ArtifactId = u64> {
    state: Mutex<CacheState<K>>,
    state_path: PathBuf,
    extension: String,
    max_bytes: Option<u64>,
    size_accounting: SizeAccounting,
    autosave: bool,
}

struct CacheState<K: ArtifactId> {
    base_directory: PathBuf,
    recency: RecencyList<K>,
    /// Running total, maintained only with `SizeAccounting::Incremental`
    total_bytes: u64,
    /// Last measured size per artifact, incremental mode only
    sizes: HashMap<K, u64>,
}

impl<K: ArtifactId> ArtifactCache<K> {
    /// Open the cache, restoring the recency list from the state file.
    ///
    /// A missing or unreadable state file starts a fresh cache. The base
    /// directory is created if needed.
    pub async fn open(config: CacheConfig) -> Result<Self> {
        let snapshot = match load_snapshot::<K>(&config.state_path).await {
            Ok(Loaded::Found(snapshot)) => Some(snapshot),
            Ok(Loaded::Missing) => {
                info!(state_path = ?config.state_path, "No saved state, starting fresh");
                None
            }
            Err(e) => {
                error!(state_path = ?config.state_path, error = %e, "Failed to load cache state, starting fresh");
                None
            }
        };

        let (saved_directory, ids) = match snapshot {
            Some(snapshot) => (Some(snapshot.base_directory), snapshot.ordered_ids),
            None => (None, Vec::new()),
        };

        let base_directory = match (&config.base_directory, saved_directory) {
            (Some(configured), Some(saved)) => {
                if *configured != saved {
                    info!(saved = ?saved, configured = ?configured, "Base directory overridden by configuration");
                }
                configured.clone()
            }
            (Some(configured), None) => configured.clone(),
            (None, Some(saved)) => saved,
            (None, None) => PathBuf::from(DEFAULT_BASE_DIRECTORY),
        };
        fs::create_dir_all(&base_directory).await?;

        let saved_len = ids.len();
        let recency = RecencyList::from_ordered(ids);
        if recency.len() != saved_len {
            warn!(
                saved = saved_len,
                kept = recency.len(),
                "Dropped duplicate ids from saved state"
            );
        }

        let mut state = CacheState {
            base_directory,
            recency,
            total_bytes: 0,
            sizes: HashMap::new(),
        };

        if config.size_accounting == SizeAccounting::Incremental {
            state.total_bytes = measure_directory(&state.base_directory).await?;
            for id in state.recency.snapshot() {
                let path = resolve_path(&state.base_directory, &id, &config.extension);
                if let Some(size) = file_size(&path).await {
                    state.sizes.insert(id, size);
                }
            }
        }

        info!(
            base_directory = ?state.base_directory,
            entries = state.recency.len(),
            max_bytes = ?config.budget(),
            "Artifact cache opened"
        );

        Ok(Self {
            max_bytes: config.budget(),
            state: Mutex::new(state),
            state_path: config.state_path,
            extension: config.extension,
            size_accounting: config.size_accounting,
            autosave: config.autosave,
        })
    }

    /// Register an artifact and return where its file lives.
    ///
    /// A new id becomes most-recently-used and, when a budget is set, the
    /// eviction policy runs afterwards. A known id is only promoted. The
    /// file does not have to exist yet.
    pub async fn reserve(&self, id: K) -> Reservation<K> {
        let mut state = self.state.lock().await;
        let path = self.path_in(&state.base_directory, &id);

        if state.recency.contains(&id) {
            state.recency.promote(&id);
            debug!(id = %id, "Artifact already reserved, promoted");
            self.persist(&state).await;
            return Reservation {
                path,
                admitted: false,
                eviction: None,
            };
        }

        state.recency.append(id.clone());
        self.refresh_size(&mut state, &id).await;
        debug!(id = %id, path = ?path, "Admitted artifact");

        let eviction = match self.max_bytes {
            Some(budget) => self.run_eviction(&mut state, budget).await,
            None => None,
        };

        self.persist(&state).await;
        Reservation {
            path,
            admitted: true,
            eviction,
        }
    }

    /// Mark a known artifact as most-recently-used. Never evicts.
    pub async fn touch(&self, id: &K) -> Touched {
        let mut state = self.state.lock().await;

        if !state.recency.promote(id) {
            warn!(id = %id, "Artifact not found in cache");
            return Touched::Unknown;
        }

        self.refresh_size(&mut state, id).await;
        debug!(id = %id, "Promoted artifact");
        self.persist(&state).await;
        Touched::Promoted
    }

    /// Paths of all known artifacts, most-recently-used first
    pub async fn sorted_paths(&self) -> Vec<PathBuf> {
        let state = self.state.lock().await;
        state
            .recency
            .iter()
            .map(|id| self.path_in(&state.base_directory, id))
            .collect()
    }

    /// Known ids, most-recently-used first
    pub async fn ids(&self) -> Vec<K> {
        self.state.lock().await.recency.snapshot()
    }

    /// Path an artifact would live at, whether or not it is known
    pub async fn path_for(&self, id: &K) -> PathBuf {
        let state = self.state.lock().await;
        self.path_in(&state.base_directory, id)
    }

    pub async fn contains(&self, id: &K) -> bool {
        self.state.lock().await.recency.contains(id)
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.recency.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.recency.is_empty()
    }

    pub async fn base_directory(&self) -> PathBuf {
        self.state.lock().await.base_directory.clone()
    }

    /// Drop an artifact and delete its file, e.g. after a failed download.
    /// Returns `false` if the id was unknown.
    pub async fn remove(&self, id: &K) -> bool {
        let mut state = self.state.lock().await;
        if !state.recency.remove(id) {
            return false;
        }

        let path = self.path_in(&state.base_directory, id);
        match fs::remove_file(&path).await {
            Ok(()) => info!(id = %id, path = ?path, "Removed artifact"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(id = %id, path = ?path, "Removed artifact had no file")
            }
            Err(e) => warn!(id = %id, path = ?path, error = %e, "Failed to delete removed artifact"),
        }

        if let Some(size) = state.sizes.remove(id) {
            state.total_bytes = state.total_bytes.saturating_sub(size);
        }
        self.persist(&state).await;
        true
    }

    /// Drop every entry whose file no longer exists and return their ids.
    ///
    /// Entries reserved for downloads still in flight have no file yet and
    /// are dropped too, so only call this when no fetch is pending.
    pub async fn verify(&self) -> Vec<K> {
        let mut state = self.state.lock().await;
        let mut missing = Vec::new();

        for id in state.recency.snapshot() {
            let path = self.path_in(&state.base_directory, &id);
            if file_size(&path).await.is_none() {
                state.recency.remove(&id);
                if let Some(size) = state.sizes.remove(&id) {
                    state.total_bytes = state.total_bytes.saturating_sub(size);
                }
                warn!(id = %id, path = ?path, "Dropping artifact whose file is missing");
                missing.push(id);
            }
        }

        if !missing.is_empty() {
            self.persist(&state).await;
        }
        missing
    }

    /// Run the eviction policy now. `None` when the cache is unbounded.
    pub async fn enforce_budget(&self) -> Option<EvictionReport<K>> {
        let budget = self.max_bytes?;
        let mut state = self.state.lock().await;
        let report = self.run_eviction(&mut state, budget).await;
        if report.as_ref().is_some_and(|r| !r.is_noop()) {
            self.persist(&state).await;
        }
        report
    }

    /// Get current cache statistics
    pub async fn stats(&self) -> Result<CacheStats> {
        let state = self.state.lock().await;
        let total_bytes = match self.size_accounting {
            SizeAccounting::DirectoryWalk => measure_directory(&state.base_directory).await?,
            SizeAccounting::Incremental => state.total_bytes,
        };
        Ok(CacheStats {
            entries: state.recency.len(),
            total_bytes,
            max_bytes: self.max_bytes,
        })
    }

    /// Current base directory and recency order
    pub async fn snapshot(&self) -> Snapshot<K> {
        let state = self.state.lock().await;
        Self::snapshot_of(&state)
    }

    /// Write the snapshot to the configured state file
    pub async fn save(&self) -> Result<()> {
        let state = self.state.lock().await;
        save_snapshot(&self.state_path, &Self::snapshot_of(&state)).await
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn max_bytes(&self) -> Option<u64> {
        self.max_bytes
    }

    fn snapshot_of(state: &CacheState<K>) -> Snapshot<K> {
        Snapshot {
            base_directory: state.base_directory.clone(),
            ordered_ids: state.recency.snapshot(),
        }
    }

    fn path_in(&self, base_directory: &Path, id: &K) -> PathBuf {
        resolve_path(base_directory, id, &self.extension)
    }

    /// Re-measure one artifact and fold the change into the running total
    async fn refresh_size(&self, state: &mut CacheState<K>, id: &K) {
        if self.size_accounting != SizeAccounting::Incremental {
            return;
        }
        let path = self.path_in(&state.base_directory, id);
        let measured = file_size(&path).await.unwrap_or(0);
        let previous = state.sizes.insert(id.clone(), measured).unwrap_or(0);
        state.total_bytes = (state.total_bytes + measured).saturating_sub(previous);
    }

    async fn current_total(&self, state: &CacheState<K>) -> Result<u64> {
        match self.size_accounting {
            SizeAccounting::DirectoryWalk => measure_directory(&state.base_directory).await,
            SizeAccounting::Incremental => Ok(state.total_bytes),
        }
    }

    async fn run_eviction(
        &self,
        state: &mut CacheState<K>,
        budget: u64,
    ) -> Option<EvictionReport<K>> {
        let total_bytes = match self.current_total(state).await {
            Ok(total) => total,
            Err(e) => {
                warn!(error = %e, "Failed to measure cache size, skipping eviction");
                return None;
            }
        };

        let incremental = self.size_accounting == SizeAccounting::Incremental;
        let CacheState {
            base_directory,
            recency,
            sizes,
            ..
        } = &mut *state;
        let recorded_sizes = if incremental { Some(sizes) } else { None };
        let report = evict_to_budget(
            recency,
            recorded_sizes,
            base_directory,
            &self.extension,
            budget,
            total_bytes,
        )
        .await;

        if incremental {
            state.total_bytes = report.total_bytes;
        }

        if report.budget_unsatisfied {
            warn!(
                total_bytes = report.total_bytes,
                budget, "Unable to bring cache within budget"
            );
        }
        Some(report)
    }

    async fn persist(&self, state: &CacheState<K>) {
        if !self.autosave {
            return;
        }
        if let Err(e) = save_snapshot(&self.state_path, &Self::snapshot_of(state)).await {
            warn!(state_path = ?self.state_path, error = %e, "Failed to save cache state");
        }
    }
}
