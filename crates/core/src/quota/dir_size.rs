//! Recursive directory size measurement.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Sums the sizes of all regular files below `root`.
///
/// Symlinks are not followed, so link cycles cannot recurse forever; the
/// size of a symlink itself is not counted.
pub fn dir_size_blocking(root: &Path) -> io::Result<u64> {
    let mut total = 0u64;

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            let message = e.to_string();
            e.into_io_error()
                .unwrap_or_else(|| io::Error::other(message))
        })?;

        if entry.file_type().is_file() {
            total = total.saturating_add(entry.metadata().map_err(io::Error::other)?.len());
        }
    }

    Ok(total)
}

/// Async wrapper around [`dir_size_blocking`] running on the blocking pool.
pub async fn dir_size(root: impl Into<PathBuf>) -> io::Result<u64> {
    let root = root.into();
    tokio::task::spawn_blocking(move || dir_size_blocking(&root))
        .await
        .map_err(io::Error::other)?
}
