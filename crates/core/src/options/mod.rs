//! Recorder options: human-friendly values, normalization and validation.
//!
//! Durations accept `"90s"`, `"10m"`, `"1h"`; quotas accept `"500M"`,
//! `"20G"`, `"1T"`. Plain numbers are seconds and bytes respectively.

mod error;
mod naming;
mod segment_time;
mod size_threshold;
mod types;
mod validate;

pub use error::OptionError;
pub use naming::{playlist_name, playlist_name_at, sanitize_file_pattern, DEFAULT_FILE_PATTERN};
pub use segment_time::{transform_segment_time, SEGMENT_TIME_PATTERN};
pub use size_threshold::{transform_dir_size_threshold, DIR_SIZE_THRESHOLD_PATTERN};
pub use types::{DirSizeThreshold, RecorderOptions, SegmentTime};
pub use validate::{
    directory_exists, resolve_path, verify_all_options, verify_dir_size_threshold, verify_path,
    verify_segment_time, MIN_DIR_SIZE_THRESHOLD_BYTES, MIN_SEGMENT_TIME_SECS,
};
