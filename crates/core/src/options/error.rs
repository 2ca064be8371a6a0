//! Error types for option normalization.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while turning human option values into canonical units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    /// Value does not follow the accepted syntax.
    #[error("{option} value has to match pattern {pattern}.")]
    PatternMismatch {
        option: &'static str,
        pattern: &'static str,
    },

    /// Numeric part of the value is zero.
    #[error("{option} value has to be more than zero.")]
    Zero { option: &'static str },

    /// Value does not fit into 64 bits once scaled.
    #[error("{option} value is too large.")]
    Overflow { option: &'static str },

    /// Path exists but is not a directory.
    #[error("{} exists but it is not a directory.", path.display())]
    NotADirectory { path: PathBuf },
}
