//! Segment finalization: moving a closed segment to its permanent path.

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs;
use tracing::debug;

use super::error::RecorderError;

/// Prefix ffmpeg-side two-phase naming uses for segments still being written.
pub const TEMP_MARKER: &str = ".~";

/// `YYYY.MM.DD.HH.MM.SS.<hex>.mp4`: a staging name with the segment's start
/// time embedded.
static STAGING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}\.\d{2}\.\d{2}\.\d{2}\.\d{2}\.\d{2})\.[0-9a-fA-F]+\.mp4$")
        .expect("valid regex")
});

/// Where a reported segment has to end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentTarget {
    /// Needs a move.
    Move { from: PathBuf, to: PathBuf },
    /// Already at its permanent path.
    InPlace(PathBuf),
}

/// Derives the permanent location of `segment`.
///
/// Relative paths are resolved against `destination`, the transcoder's
/// working directory.
pub fn segment_target(
    destination: &Path,
    file_pattern: &str,
    segment: &str,
) -> Result<SegmentTarget, String> {
    let from = destination.join(segment);
    let Some(file_name) = from.file_name().and_then(|n| n.to_str()) else {
        return Ok(SegmentTarget::InPlace(from));
    };

    if let Some(name) = file_name.strip_prefix(TEMP_MARKER) {
        let to = from.with_file_name(name);
        return Ok(SegmentTarget::Move { from, to });
    }

    if let Some(caps) = STAGING_RE.captures(file_name) {
        let started = NaiveDateTime::parse_from_str(&caps[1], "%Y.%m.%d.%H.%M.%S")
            .map_err(|e| format!("invalid timestamp in '{}': {}", file_name, e))?;
        let relative = format_pattern(file_pattern, &started)?;
        let to = destination.join(format!("{}.mp4", relative));
        return Ok(SegmentTarget::Move { from, to });
    }

    Ok(SegmentTarget::InPlace(from))
}

fn format_pattern(pattern: &str, at: &NaiveDateTime) -> Result<String, String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid file pattern '{}'", pattern));
    }

    let mut out = String::new();
    write!(out, "{}", at.format_with_items(items.iter()))
        .map_err(|_| format!("cannot format file pattern '{}'", pattern))?;
    Ok(out)
}

/// Result of finalizing one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finalized {
    /// Permanent path.
    pub path: PathBuf,
    /// Directory that had to be created for it, if any.
    pub created_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub struct FinalizeOutcome {
    pub segment: String,
    pub result: Result<Finalized, RecorderError>,
    pub elapsed: Duration,
}

/// Moves `segment` to its permanent path. Runs detached from the session
/// loop, so everything it needs is passed by value.
pub async fn finalize_segment(
    destination: PathBuf,
    file_pattern: String,
    segment: String,
) -> FinalizeOutcome {
    let started = Instant::now();
    let result = finalize(&destination, &file_pattern, &segment).await;
    FinalizeOutcome {
        segment,
        result,
        elapsed: started.elapsed(),
    }
}

async fn finalize(
    destination: &Path,
    file_pattern: &str,
    segment: &str,
) -> Result<Finalized, RecorderError> {
    let (from, to) = match segment_target(destination, file_pattern, segment) {
        Ok(SegmentTarget::InPlace(path)) => {
            return Ok(Finalized {
                path,
                created_dir: None,
            })
        }
        Ok(SegmentTarget::Move { from, to }) => (from, to),
        Err(reason) => {
            let from = destination.join(segment);
            return Err(RecorderError::FinalizeFailed {
                to: from.clone(),
                from,
                reason,
            });
        }
    };

    let fail = |e: io::Error| RecorderError::FinalizeFailed {
        from: from.clone(),
        to: to.clone(),
        reason: e.to_string(),
    };

    let mut created_dir = None;
    if let Some(parent) = to.parent() {
        if !fs::try_exists(parent).await.map_err(fail)? {
            fs::create_dir_all(parent).await.map_err(fail)?;
            created_dir = Some(parent.to_path_buf());
        }
    }

    move_file(&from, &to).await.map_err(fail)?;
    debug!("Finalized segment {:?} -> {:?}", from, to);

    Ok(Finalized {
        path: to,
        created_dir,
    })
}

/// Rename, falling back to copy + remove across filesystems.
async fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        // EXDEV is 18 on Linux
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) => {
            fs::copy(from, to).await?;
            fs::remove_file(from).await
        }
        Err(e) => Err(e),
    }
}
