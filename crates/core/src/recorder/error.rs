//! Error types for the recorder module.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors delivered through the `error` event.
///
/// `start()`/`stop()` never return these; every failure is reported
/// asynchronously to listeners. `try_start()`/`try_stop()` additionally hand
/// back a state rejection. Message texts are stable.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecorderError {
    #[error("Process already spawned.")]
    AlreadySpawned,

    #[error("No process spawned.")]
    NoProcessSpawned,

    /// ffmpeg could not open a segment file for writing.
    #[error("Failed to open file '{path}'.")]
    SegmentFailed { path: String },

    #[error("Failed to spawn {}: {reason}", binary.display())]
    SpawnFailed { binary: PathBuf, reason: String },

    /// The running process reported a failure (e.g. its output stream broke).
    #[error("Transcoder process failed: {reason}")]
    ProcessFailed { reason: String },

    /// The process exited without being asked to.
    #[error("Transcoder exited unexpectedly with code {}", display_code(*code))]
    ProcessExited { code: Option<i32> },

    #[error("Failed to move {} to {}: {reason}", from.display(), to.display())]
    FinalizeFailed {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },

    #[error("Failed to measure {}: {reason}", path.display())]
    QuotaFailed { path: PathBuf, reason: String },

    /// Auto-clear found nothing it is allowed to delete.
    #[error("Can't remove current directory.")]
    CannotRemoveCurrentDirectory,

    #[error("Failed to remove {}: {reason}", path.display())]
    WipeFailed { path: PathBuf, reason: String },
}

fn display_code(code: Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

impl RecorderError {
    /// Short stable identifier, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlreadySpawned => "already_spawned",
            Self::NoProcessSpawned => "no_process_spawned",
            Self::SegmentFailed { .. } => "segment_failed",
            Self::SpawnFailed { .. } => "spawn_failed",
            Self::ProcessFailed { .. } => "process_failed",
            Self::ProcessExited { .. } => "process_exited",
            Self::FinalizeFailed { .. } => "finalize_failed",
            Self::QuotaFailed { .. } => "quota_failed",
            Self::CannotRemoveCurrentDirectory => "cannot_remove_current_directory",
            Self::WipeFailed { .. } => "wipe_failed",
        }
    }
}

/// Construction-time validation failure listing every violated option.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}: {}", errors.join("; "))]
pub struct RecorderValidationError {
    pub message: String,
    pub errors: Vec<String>,
}

impl RecorderValidationError {
    pub fn new(errors: Vec<String>) -> Self {
        Self {
            message: "Options invalid".to_string(),
            errors,
        }
    }
}
