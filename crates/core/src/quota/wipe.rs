//! Removal of the oldest recording under the destination root.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tokio::fs;
use tracing::info;

#[derive(Debug, Error)]
pub enum WipeError {
    /// Only the entry being written to is left.
    #[error("Can't remove current directory.")]
    OnlyCurrentEntry,

    #[error("I/O error while wiping {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WipeError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Deletes the oldest top-level entry under `root` and returns its path.
///
/// Age is the creation time, falling back to the modification time on
/// filesystems that do not record it. Paths in `keep` are never removed and
/// do not count as candidates. With fewer than two candidates nothing is
/// deleted, since the only one left is the one currently being recorded.
pub async fn remove_oldest_entry(root: &Path, keep: &[PathBuf]) -> Result<PathBuf, WipeError> {
    let mut candidates: Vec<(SystemTime, PathBuf, bool)> = Vec::new();

    let mut entries = fs::read_dir(root).await.map_err(|e| WipeError::io(root, e))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| WipeError::io(root, e))?
    {
        let path = entry.path();
        if keep.iter().any(|k| k == &path) {
            continue;
        }

        let meta = fs::symlink_metadata(&path)
            .await
            .map_err(|e| WipeError::io(&path, e))?;
        let born = meta
            .created()
            .or_else(|_| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        candidates.push((born, path, meta.is_dir()));
    }

    if candidates.len() < 2 {
        return Err(WipeError::OnlyCurrentEntry);
    }

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    let (_, oldest, is_dir) = candidates.swap_remove(0);

    let removed = if is_dir {
        fs::remove_dir_all(&oldest).await
    } else {
        fs::remove_file(&oldest).await
    };
    removed.map_err(|e| WipeError::io(&oldest, e))?;

    info!("Removed oldest recording entry {:?}", oldest);
    Ok(oldest)
}
