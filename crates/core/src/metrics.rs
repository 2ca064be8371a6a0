//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Transcoder process lifecycle (spawns, exits)
//! - Segment finalization
//! - Storage quota enforcement

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Transcoder Metrics
// =============================================================================

/// Transcoder spawn attempts by result.
pub static TRANSCODER_SPAWNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "recorder_transcoder_spawns_total",
            "Total transcoder spawn attempts",
        ),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

/// Sessions stopped, by stop reason.
pub static SESSIONS_STOPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("recorder_sessions_stopped_total", "Total stopped sessions"),
        &["reason"],
    )
    .unwrap()
});

/// Recorder errors by kind.
pub static RECORDER_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("recorder_errors_total", "Total recorder errors"),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Segment Metrics
// =============================================================================

/// Segments opened by the transcoder.
pub static SEGMENTS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("recorder_segments_started_total", "Total segments opened").unwrap()
});

/// Segment finalizations by result.
pub static SEGMENTS_FINALIZED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "recorder_segments_finalized_total",
            "Total segment finalizations",
        ),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

/// Finalization duration in seconds.
pub static FINALIZE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "recorder_finalize_duration_seconds",
            "Duration of moving a segment to its permanent path",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Quota Metrics
// =============================================================================

/// Quota evaluations that found the destination full.
pub static SPACE_FULL_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "recorder_space_full_total",
        "Total quota evaluations that found the destination full",
    )
    .unwrap()
});

/// Oldest-entry removals performed by auto-clear.
pub static SPACE_WIPED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "recorder_space_wiped_total",
        "Total oldest-entry removals by auto-clear",
    )
    .unwrap()
});

/// Last measured destination size in bytes.
pub static DESTINATION_BYTES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "recorder_destination_bytes",
        "Last measured size of the destination directory",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Transcoder
        Box::new(TRANSCODER_SPAWNS.clone()),
        Box::new(SESSIONS_STOPPED.clone()),
        Box::new(RECORDER_ERRORS.clone()),
        // Segments
        Box::new(SEGMENTS_STARTED.clone()),
        Box::new(SEGMENTS_FINALIZED.clone()),
        Box::new(FINALIZE_DURATION.clone()),
        // Quota
        Box::new(SPACE_FULL_TOTAL.clone()),
        Box::new(SPACE_WIPED_TOTAL.clone()),
        Box::new(DESTINATION_BYTES.clone()),
    ]
}
