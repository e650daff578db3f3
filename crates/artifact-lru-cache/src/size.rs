//! Size accounting for the cache directory

use crate::error::Result;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use tracing::warn;
use walkdir::WalkDir;

/// How the cache learns the number of bytes it occupies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizeAccounting {
    /// Walk the base directory on every growth event
    #[default]
    DirectoryWalk,
    /// Walk once at open, then track per-artifact deltas
    Incremental,
}

impl FromStr for SizeAccounting {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "walk" | "directory-walk" => Ok(SizeAccounting::DirectoryWalk),
            "incremental" => Ok(SizeAccounting::Incremental),
            other => Err(format!("unknown size accounting mode: {}", other)),
        }
    }
}

/// Sum of the sizes of all regular files below `dir`, recursively.
///
/// A missing directory counts as empty. Entries that cannot be read are
/// skipped and logged rather than failing the whole walk.
pub fn directory_size(dir: &Path) -> u64 {
    if !dir.exists() {
        return 0;
    }

    let mut total = 0;
    for entry in WalkDir::new(dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = ?dir, error = %e, "Skipping unreadable entry during size walk");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match entry.metadata() {
            Ok(metadata) => total += metadata.len(),
            Err(e) => {
                warn!(path = ?entry.path(), error = %e, "Failed to stat file during size walk");
            }
        }
    }
    total
}

/// Run [`directory_size`] on a blocking thread
pub(crate) async fn measure_directory(dir: &Path) -> Result<u64> {
    let dir: PathBuf = dir.to_path_buf();
    let total = tokio::task::spawn_blocking(move || directory_size(&dir)).await?;
    Ok(total)
}

/// Size of a single regular file, `None` if it does not exist
pub(crate) async fn file_size(path: &Path) -> Option<u64> {
    match fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => Some(metadata.len()),
        _ => None,
    }
}
