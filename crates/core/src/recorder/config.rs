//! Resolved, immutable session configuration.

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::error::RecorderValidationError;
use crate::options::{
    playlist_name, resolve_path, sanitize_file_pattern, transform_dir_size_threshold,
    transform_segment_time, verify_all_options, RecorderOptions, DEFAULT_FILE_PATTERN,
};

/// Segment duration used when none is configured, in seconds.
pub const DEFAULT_SEGMENT_TIME_SECS: u64 = 600;

/// Default transcoder executable, looked up on `PATH`.
pub const DEFAULT_FFMPEG_BINARY: &str = "ffmpeg";

/// Configuration of one recording session with every option normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecorderConfig {
    /// Source stream URI.
    pub uri: String,
    /// Absolute destination directory; also the transcoder's working directory.
    pub destination: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Playlist name without extension.
    pub playlist_name: String,
    /// Sanitized strftime pattern for segment files.
    pub file_pattern: String,
    /// Segment duration in seconds.
    pub segment_time: u64,
    /// Storage quota in bytes, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir_size_threshold: Option<u64>,
    pub ffmpeg_binary: PathBuf,
    pub no_audio: bool,
    pub auto_clear: bool,
}

impl RecorderConfig {
    /// Validates `options` and resolves every default.
    ///
    /// All checks run; the error lists every violation.
    pub fn resolve(
        uri: impl Into<String>,
        destination: impl AsRef<Path>,
        options: RecorderOptions,
    ) -> Result<Self, RecorderValidationError> {
        let destination = destination.as_ref();
        let errors = verify_all_options(destination, &options);
        if !errors.is_empty() {
            return Err(RecorderValidationError::new(errors));
        }

        let segment_time = options
            .segment_time
            .as_ref()
            .map(transform_segment_time)
            .transpose()
            .map_err(|e| RecorderValidationError::new(vec![e.to_string()]))?
            .unwrap_or(DEFAULT_SEGMENT_TIME_SECS);

        let dir_size_threshold = options
            .dir_size_threshold
            .as_ref()
            .map(transform_dir_size_threshold)
            .transpose()
            .map_err(|e| RecorderValidationError::new(vec![e.to_string()]))?;

        Ok(Self {
            uri: uri.into(),
            destination: resolve_path(destination),
            title: options.title.filter(|t| !t.is_empty()),
            playlist_name: playlist_name(options.playlist_name.as_deref()),
            file_pattern: sanitize_file_pattern(
                options.file_pattern.as_deref().unwrap_or(DEFAULT_FILE_PATTERN),
            ),
            segment_time,
            dir_size_threshold,
            ffmpeg_binary: options
                .ffmpeg_binary
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FFMPEG_BINARY)),
            no_audio: options.no_audio,
            auto_clear: options.auto_clear,
        })
    }

    /// Playlist file name including the extension.
    pub fn playlist_file_name(&self) -> String {
        format!("{}.m3u8", self.playlist_name)
    }

    /// Absolute path of the playlist the transcoder writes.
    pub fn playlist_path(&self) -> PathBuf {
        self.destination.join(self.playlist_file_name())
    }
}

/// Payload of the `started` event: the configuration plus the playlist the
/// transcoder announced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartedInfo {
    #[serde(flatten)]
    pub config: RecorderConfig,
    pub playlist: String,
}
