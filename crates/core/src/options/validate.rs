//! Option validation.
//!
//! Every check runs regardless of earlier failures so callers get the full
//! list of problems in one go.

use std::path::{Path, PathBuf};

use super::error::OptionError;
use super::segment_time::transform_segment_time;
use super::size_threshold::transform_dir_size_threshold;
use super::types::{DirSizeThreshold, RecorderOptions, SegmentTime};

/// Shortest segment duration accepted, in seconds.
pub const MIN_SEGMENT_TIME_SECS: u64 = 15;

/// Smallest storage quota accepted, in bytes (200 MiB).
pub const MIN_DIR_SIZE_THRESHOLD_BYTES: u64 = 200 * 1024 * 1024;

/// Checks whether `path` is an existing directory.
///
/// Missing paths are `Ok(false)`; anything that exists but is not a
/// directory is an error. Symlinks are not followed.
pub fn directory_exists(path: &Path) -> Result<bool, OptionError> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(true),
        Ok(_) => Err(OptionError::NotADirectory {
            path: path.to_path_buf(),
        }),
        Err(_) => Ok(false),
    }
}

/// Resolves `path` against the current working directory.
pub fn resolve_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

pub fn verify_path(path: &Path) -> Option<String> {
    let path = resolve_path(path);
    match directory_exists(&path) {
        Ok(true) => None,
        Ok(false) => Some(format!("{} is not a directory", path.display())),
        Err(e) => Some(e.to_string()),
    }
}

pub fn verify_segment_time(value: &SegmentTime) -> Option<String> {
    match transform_segment_time(value) {
        Ok(seconds) if seconds < MIN_SEGMENT_TIME_SECS => Some(format!(
            "There is no sense to set segment_time value to less than {} seconds.",
            MIN_SEGMENT_TIME_SECS
        )),
        Ok(_) => None,
        Err(e) => Some(e.to_string()),
    }
}

pub fn verify_dir_size_threshold(value: &DirSizeThreshold) -> Option<String> {
    match transform_dir_size_threshold(value) {
        Ok(bytes) if bytes < MIN_DIR_SIZE_THRESHOLD_BYTES => Some(
            "There is no sense to set dir_size_threshold value to less than 200 MB.".to_string(),
        ),
        Ok(_) => None,
        Err(e) => Some(e.to_string()),
    }
}

/// Runs all option checks and returns every violation message.
pub fn verify_all_options(destination: &Path, options: &RecorderOptions) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(error) = verify_path(destination) {
        errors.push(error);
    }

    if let Some(error) = options.segment_time.as_ref().and_then(verify_segment_time) {
        errors.push(error);
    }

    if let Some(error) = options
        .dir_size_threshold
        .as_ref()
        .and_then(verify_dir_size_threshold)
    {
        errors.push(error);
    }

    errors
}
