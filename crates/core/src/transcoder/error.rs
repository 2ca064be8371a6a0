//! Error types for the transcoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while launching or checking the transcoder.
#[derive(Debug, Error)]
pub enum TranscoderError {
    /// Transcoder binary not found.
    #[error("FFmpeg not found at path: {}", path.display())]
    NotFound { path: PathBuf },

    /// Process could not be started.
    #[error("Failed to spawn transcoder: {reason}")]
    SpawnFailed { reason: String },

    /// `-version` probe returned a failure status.
    #[error("Transcoder version check failed: {reason}")]
    VersionCheckFailed { reason: String },

    /// I/O error while talking to the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscoderError {
    pub fn spawn_failed(reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            reason: reason.into(),
        }
    }

    /// Maps a spawn-time I/O error, reporting a missing binary distinctly.
    pub fn from_spawn_io(program: &std::path::Path, e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                path: program.to_path_buf(),
            }
        } else {
            Self::Io(e)
        }
    }
}
