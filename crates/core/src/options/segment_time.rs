//! Segment duration normalization.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::error::OptionError;
use super::types::SegmentTime;

/// Accepted syntax for textual segment durations.
pub const SEGMENT_TIME_PATTERN: &str = r"^(\d+)(s|m|h)?$";

const OPTION: &str = "segment_time";

static SEGMENT_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(SEGMENT_TIME_PATTERN).expect("segment time pattern is valid"));

/// Duration unit suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DurationFactor {
    Seconds,
    Minutes,
    Hours,
}

impl DurationFactor {
    fn from_suffix(suffix: Option<&str>) -> Self {
        match suffix {
            Some("m") => Self::Minutes,
            Some("h") => Self::Hours,
            _ => Self::Seconds,
        }
    }

    fn seconds(self) -> u64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
            Self::Hours => 60 * 60,
        }
    }
}

/// Converts a segment duration option into seconds.
///
/// Numbers are returned as given; strings are parsed with
/// [`SEGMENT_TIME_PATTERN`].
pub fn transform_segment_time(value: &SegmentTime) -> Result<u64, OptionError> {
    match value {
        SegmentTime::Seconds(seconds) => Ok(*seconds),
        SegmentTime::Text(text) => {
            let (operand, factor) = match_segment_time(text)?;
            operand
                .checked_mul(factor.seconds())
                .ok_or(OptionError::Overflow { option: OPTION })
        }
    }
}

fn match_segment_time(value: &str) -> Result<(u64, DurationFactor), OptionError> {
    let caps = SEGMENT_TIME_RE
        .captures(value)
        .ok_or(OptionError::PatternMismatch {
            option: OPTION,
            pattern: SEGMENT_TIME_PATTERN,
        })?;

    let operand: u64 = caps[1]
        .parse()
        .map_err(|_| OptionError::Overflow { option: OPTION })?;
    if operand == 0 {
        return Err(OptionError::Zero { option: OPTION });
    }

    let factor = DurationFactor::from_suffix(caps.get(2).map(|m| m.as_str()));
    Ok((operand, factor))
}
