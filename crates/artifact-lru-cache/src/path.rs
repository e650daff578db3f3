//! Artifact path resolution

use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Canonical on-disk location of an artifact: `{base_dir}/{id}.{extension}`.
///
/// Pure; the recency list stores only ids and relies on this mapping being
/// stable to find files again after a restart.
pub fn resolve_path(base_dir: &Path, id: &impl Display, extension: &str) -> PathBuf {
    base_dir.join(format!("{}.{}", id, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        let path = resolve_path(Path::new("/data/mapfolder"), &1234567, "zip");
        assert_eq!(path, PathBuf::from("/data/mapfolder/1234567.zip"));
    }

    #[test]
    fn test_resolve_path_is_deterministic() {
        let base = Path::new("cache");
        assert_eq!(
            resolve_path(base, &"abc", "osz"),
            resolve_path(base, &"abc", "osz")
        );
        assert_ne!(
            resolve_path(base, &1, "zip"),
            resolve_path(base, &2, "zip")
        );
    }
}
