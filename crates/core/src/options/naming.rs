//! Playlist and segment naming.

use chrono::{DateTime, Local, TimeZone};
use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Default strftime pattern for segment files.
pub const DEFAULT_FILE_PATTERN: &str = "%Y.%m.%d/%H.%M.%S";

static COLONS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r":+").expect("valid regex"));
static UNDERSCORES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").expect("valid regex"));
static PATTERN_SEPARATORS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s:]+").expect("valid regex"));

/// Resolves the playlist name: a sanitized custom name, or the current
/// local time formatted as `YYYY.MM.DD-HH.MM.SS`.
pub fn playlist_name(custom: Option<&str>) -> String {
    playlist_name_at(custom, Local::now())
}

/// Same as [`playlist_name`] with an explicit clock.
pub fn playlist_name_at<Tz: TimeZone>(custom: Option<&str>, now: DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match custom.filter(|name| !name.is_empty()) {
        Some(name) => {
            let name = COLONS_RE.replace_all(name, "_");
            UNDERSCORES_RE.replace_all(&name, "_").into_owned()
        }
        None => now.format("%Y.%m.%d-%H.%M.%S").to_string(),
    }
}

/// Replaces whitespace and colons in a file pattern so the generated paths
/// stay portable.
pub fn sanitize_file_pattern(pattern: &str) -> String {
    PATTERN_SEPARATORS_RE.replace_all(pattern, "_").into_owned()
}
