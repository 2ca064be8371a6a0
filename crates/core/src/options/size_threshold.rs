//! Storage quota normalization.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::error::OptionError;
use super::types::DirSizeThreshold;

/// Accepted syntax for textual storage quotas.
pub const DIR_SIZE_THRESHOLD_PATTERN: &str = r"^(\d+)(M|G|T)?$";

const OPTION: &str = "dir_size_threshold";

static DIR_SIZE_THRESHOLD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(DIR_SIZE_THRESHOLD_PATTERN).expect("dir size threshold pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BytesFactor {
    Megabytes,
    Gigabytes,
    Terabytes,
}

impl BytesFactor {
    fn from_suffix(suffix: Option<&str>) -> Self {
        match suffix {
            Some("G") => Self::Gigabytes,
            Some("T") => Self::Terabytes,
            _ => Self::Megabytes,
        }
    }

    fn bytes(self) -> u64 {
        match self {
            Self::Megabytes => 1024u64.pow(2),
            Self::Gigabytes => 1024u64.pow(3),
            Self::Terabytes => 1024u64.pow(4),
        }
    }
}

/// Converts a storage quota option into bytes.
///
/// Numbers are bytes already; strings are parsed with
/// [`DIR_SIZE_THRESHOLD_PATTERN`] where a missing suffix means megabytes.
pub fn transform_dir_size_threshold(value: &DirSizeThreshold) -> Result<u64, OptionError> {
    match value {
        DirSizeThreshold::Bytes(bytes) => Ok(*bytes),
        DirSizeThreshold::Text(text) => {
            let (operand, factor) = match_dir_size_threshold(text)?;
            operand
                .checked_mul(factor.bytes())
                .ok_or(OptionError::Overflow { option: OPTION })
        }
    }
}

fn match_dir_size_threshold(value: &str) -> Result<(u64, BytesFactor), OptionError> {
    let caps = DIR_SIZE_THRESHOLD_RE
        .captures(value)
        .ok_or(OptionError::PatternMismatch {
            option: OPTION,
            pattern: DIR_SIZE_THRESHOLD_PATTERN,
        })?;

    let operand: u64 = caps[1]
        .parse()
        .map_err(|_| OptionError::Overflow { option: OPTION })?;
    if operand == 0 {
        return Err(OptionError::Zero { option: OPTION });
    }

    Ok((operand, BytesFactor::from_suffix(caps.get(2).map(|m| m.as_str()))))
}
