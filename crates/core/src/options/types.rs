//! Types for recorder options.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Segment duration as given by the caller.
///
/// Either a plain number of seconds or a human string such as `"90s"`,
/// `"10m"` or `"1h"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SegmentTime {
    Seconds(u64),
    Text(String),
}

impl From<u64> for SegmentTime {
    fn from(value: u64) -> Self {
        Self::Seconds(value)
    }
}

impl From<&str> for SegmentTime {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Storage quota as given by the caller.
///
/// Either a plain number of bytes or a human string such as `"500M"`,
/// `"20G"` or `"1T"`. A bare number inside a string is read as megabytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DirSizeThreshold {
    Bytes(u64),
    Text(String),
}

impl From<u64> for DirSizeThreshold {
    fn from(value: u64) -> Self {
        Self::Bytes(value)
    }
}

impl From<&str> for DirSizeThreshold {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Options accepted by [`crate::Recorder::new`].
///
/// Everything is optional; unset values fall back to the defaults documented
/// on each field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecorderOptions {
    /// Title embedded as container metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Playlist (manifest) name without extension. Defaults to the start
    /// timestamp, e.g. `2022.02.24-04.45.00`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_name: Option<String>,

    /// strftime pattern for segment files, relative to the destination.
    /// Defaults to `%Y.%m.%d/%H.%M.%S`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_pattern: Option<String>,

    /// Segment duration. Defaults to 600 seconds, minimum 15.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_time: Option<SegmentTime>,

    /// Storage quota for the destination directory. Minimum 200 MiB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir_size_threshold: Option<DirSizeThreshold>,

    /// ffmpeg executable. Defaults to `ffmpeg` looked up on `PATH`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg_binary: Option<PathBuf>,

    /// Drop the audio track instead of transcoding it to AAC.
    #[serde(default)]
    pub no_audio: bool,

    /// Delete the oldest recording when the quota is reached instead of
    /// stopping.
    #[serde(default)]
    pub auto_clear: bool,
}

impl RecorderOptions {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_playlist_name(mut self, name: impl Into<String>) -> Self {
        self.playlist_name = Some(name.into());
        self
    }

    pub fn with_file_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_pattern = Some(pattern.into());
        self
    }

    pub fn with_segment_time(mut self, segment_time: impl Into<SegmentTime>) -> Self {
        self.segment_time = Some(segment_time.into());
        self
    }

    pub fn with_dir_size_threshold(mut self, threshold: impl Into<DirSizeThreshold>) -> Self {
        self.dir_size_threshold = Some(threshold.into());
        self
    }

    pub fn with_ffmpeg_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.ffmpeg_binary = Some(binary.into());
        self
    }

    pub fn with_no_audio(mut self, no_audio: bool) -> Self {
        self.no_audio = no_audio;
        self
    }

    pub fn with_auto_clear(mut self, auto_clear: bool) -> Self {
        self.auto_clear = auto_clear;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_values_deserialize() {
        let json = r#"{"segment_time": "10m", "dir_size_threshold": 1048576000}"#;
        let options: RecorderOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.segment_time, Some(SegmentTime::Text("10m".into())));
        assert_eq!(
            options.dir_size_threshold,
            Some(DirSizeThreshold::Bytes(1_048_576_000))
        );
        assert!(!options.no_audio);
        assert!(!options.auto_clear);
    }

    #[test]
    fn test_builder() {
        let options = RecorderOptions::default()
            .with_title("Yard Camera")
            .with_segment_time("1h")
            .with_dir_size_threshold(500u64)
            .with_auto_clear(true);

        assert_eq!(options.title.as_deref(), Some("Yard Camera"));
        assert_eq!(options.segment_time, Some(SegmentTime::Text("1h".into())));
        assert_eq!(options.dir_size_threshold, Some(DirSizeThreshold::Bytes(500)));
        assert!(options.auto_clear);
    }
}
