//! Persisted snapshot of the recency list

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Durable form of the cache membership and order.
///
/// The JSON field names are fixed so existing state files keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot<K> {
    pub base_directory: PathBuf,
    /// Most-recently-used first
    #[serde(rename = "beatmap_ids")]
    pub ordered_ids: Vec<K>,
}

/// Result of loading a snapshot
#[derive(Debug, PartialEq, Eq)]
pub enum Loaded<K> {
    Found(Snapshot<K>),
    /// No state file exists yet
    Missing,
}

/// Read a snapshot from `path`.
///
/// A missing file is reported as [`Loaded::Missing`]; an unparsable one as
/// [`CacheError::CorruptState`].
pub async fn load_snapshot<K>(path: &Path) -> Result<Loaded<K>>
where
    K: for<'de> Deserialize<'de>,
{
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Loaded::Missing),
        Err(e) => return Err(e.into()),
    };

    let snapshot: Snapshot<K> = serde_json::from_slice(&bytes)
        .map_err(|e| CacheError::CorruptState(format!("{}: {}", path.display(), e)))?;
    Ok(Loaded::Found(snapshot))
}

/// Write a snapshot to `path` atomically.
///
/// The JSON is written and synced to a temporary file next to the target,
/// then renamed over it, so a crash leaves either the old or the new file.
pub async fn save_snapshot<K: Serialize>(path: &Path, snapshot: &Snapshot<K>) -> Result<()> {
    let json =
        serde_json::to_vec(snapshot).map_err(|e| CacheError::Serialization(e.to_string()))?;

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent).await?;
    }

    let temp_path = temp_path_for(path);
    if let Err(e) = write_synced(&temp_path, &json).await {
        warn!(temp_path = ?temp_path, error = %e, "Failed to write snapshot temp file");
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp_path, path).await {
        warn!(temp_path = ?temp_path, path = ?path, error = %e, "Failed to rename snapshot temp file");
        let _ = fs::remove_file(&temp_path).await;
        return Err(e.into());
    }

    // The rename itself is only durable once the directory entry is flushed
    let dir = parent.unwrap_or_else(|| Path::new("."));
    if let Err(e) = sync_dir(dir).await {
        warn!(dir = ?dir, error = %e, "Failed to sync snapshot directory");
    }

    debug!(path = ?path, entries = snapshot.ordered_ids.len(), "Saved cache snapshot");
    Ok(())
}

async fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

async fn sync_dir(dir: &Path) -> Result<()> {
    let dir = fs::File::open(dir).await?;
    dir.sync_all().await?;
    Ok(())
}

/// `.{name}.tmp.{pid}` in the same directory as `path`
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot".to_string());
    path.with_file_name(format!(".{}.tmp.{}", name, std::process::id()))
}
