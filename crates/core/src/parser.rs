//! Classification of ffmpeg diagnostic output.
//!
//! ffmpeg's stderr is not a stable interface. Only a handful of known
//! messages are matched; anything else passes through untouched as
//! progress text.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static FAILED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Failed to open segment '(.+?)'").expect("valid regex"));
static OPENING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Opening '(.+?)' for writing").expect("valid regex"));
static STARTED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Output #0, hls, to '(?:\./)?(.+?\.m3u8)':").expect("valid regex")
});

/// Suffix of the manifest file the HLS muxer rewrites on every refresh.
const MANIFEST_TEMP_SUFFIX: &str = ".m3u8.tmp";

/// Semantic meaning of one diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSignal {
    /// A new segment file was opened.
    Opening(String),
    /// ffmpeg could not open a segment file.
    Failed(String),
    /// The HLS output stream was opened; carries the playlist file name.
    OutputStarted(String),
    /// Nothing recognised.
    NoMatch,
}

/// Classifies a single line.
///
/// Segment failures are checked before openings.
pub fn classify_line(line: &str) -> OutputSignal {
    if let Some(caps) = FAILED_RE.captures(line) {
        return OutputSignal::Failed(caps[1].to_string());
    }

    if let Some(caps) = OPENING_RE.captures(line) {
        let path = &caps[1];
        if path.ends_with(MANIFEST_TEMP_SUFFIX) {
            return OutputSignal::NoMatch;
        }
        return OutputSignal::Opening(path.to_string());
    }

    if let Some(caps) = STARTED_RE.captures(line) {
        return OutputSignal::OutputStarted(caps[1].to_string());
    }

    OutputSignal::NoMatch
}
