//! Storage quota measurement and enforcement primitives.
//!
//! Measurement is kept free of policy: [`dir_size`] only reports bytes,
//! [`exceeds_threshold`] decides what counts as full.

mod dir_size;
mod wipe;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use dir_size::{dir_size, dir_size_blocking};
pub use wipe::{remove_oldest_entry, WipeError};

/// Margin added to the measured usage, in percent. Files keep growing while
/// they are measured, so the quota trips slightly early.
pub const APPROXIMATION_PERCENTAGE: u64 = 1;

/// One quota measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceUsage {
    /// Measured directory.
    pub path: PathBuf,
    /// Bytes used.
    pub used: u64,
    /// Configured quota in bytes.
    pub threshold: u64,
}

/// `used` plus the approximation margin, rounded up.
pub fn with_margin(used: u64) -> u64 {
    let scaled = u128::from(used) * u128::from(100 + APPROXIMATION_PERCENTAGE);
    let rounded = scaled.div_ceil(100);
    u64::try_from(rounded).unwrap_or(u64::MAX)
}

/// Whether `used` (with margin) reaches `threshold`.
pub fn exceeds_threshold(used: u64, threshold: u64) -> bool {
    with_margin(used) >= threshold
}
