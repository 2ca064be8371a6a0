//! Storage quota integration tests.
//!
//! Large recordings are simulated with sparse files, so the 200 MiB minimum
//! quota can be exceeded without writing real data.

mod common;

use std::time::Duration;

use common::{count, kinds, sparse_file, TestHarness};
use recorder_core::{
    testing::{fixtures, MOCK_KILL_EXIT_CODE},
    EventKind, RecorderError, RecorderEvent, RecorderOptions, SpaceUsage, StopReason,
};

const MIB: u64 = 1024 * 1024;
const THRESHOLD: u64 = 200 * MIB;

fn quota_options(auto_clear: bool) -> RecorderOptions {
    RecorderOptions::default()
        .with_playlist_name("cam")
        .with_dir_size_threshold("200M")
        .with_auto_clear(auto_clear)
}

#[tokio::test]
async fn test_full_destination_prevents_start() {
    let mut h = TestHarness::with_options(quota_options(false));
    sparse_file(&h.path("2020.06.24/old.mp4"), 210 * MIB);

    h.recorder.start().await;
    assert!(!h.recorder.is_recording());

    let events = h.events.until(EventKind::Stopped).await;
    assert_eq!(
        events,
        vec![
            RecorderEvent::Start {
                reason: "programmatically".into()
            },
            RecorderEvent::SpaceFull(SpaceUsage {
                path: h.recorder.config().destination.clone(),
                used: 210 * MIB,
                threshold: THRESHOLD,
            }),
            RecorderEvent::Stopped {
                code: None,
                reason: StopReason::SpaceFull,
            },
        ]
    );
    assert_eq!(h.launcher.spawn_count().await, 0);
}

#[tokio::test]
async fn test_quota_reached_while_recording_stops_once() {
    let mut h = TestHarness::with_options(quota_options(false));

    h.recorder.start().await;
    assert!(h.recorder.is_recording());

    sparse_file(&h.path("2020.06.25/10.00.00.mp4"), 210 * MIB);
    h.process()
        .await
        .emit_line(fixtures::opening("2020.06.25/10.00.00.mp4"))
        .await;

    let events = h.events.until(EventKind::Stopped).await;
    assert_eq!(count(&events, EventKind::SpaceFull), 1);
    assert_eq!(count(&events, EventKind::Stop), 1);
    assert_eq!(count(&events, EventKind::SpaceWiped), 0);
    assert!(events.contains(&RecorderEvent::Stop {
        reason: StopReason::SpaceFull
    }));
    assert_eq!(
        events.last().unwrap(),
        &RecorderEvent::Stopped {
            code: Some(MOCK_KILL_EXIT_CODE),
            reason: StopReason::SpaceFull,
        }
    );
}

#[tokio::test]
async fn test_below_threshold_emits_nothing() {
    let mut h = TestHarness::with_options(quota_options(false));
    sparse_file(&h.path("2020.06.24/old.mp4"), 100 * MIB);

    h.recorder.start().await;
    let process = h.process().await;
    process
        .emit_line(fixtures::opening("2020.06.25/10.00.00.mp4"))
        .await;
    process.emit_line(fixtures::progress()).await;

    let events = h.events.until(EventKind::Progress).await;
    assert_eq!(
        kinds(&events),
        vec![
            EventKind::Start,
            EventKind::SegmentStarted,
            EventKind::Progress
        ]
    );
    assert!(h.recorder.is_recording());
}

#[tokio::test]
async fn test_auto_clear_removes_oldest_entry() {
    let mut h = TestHarness::with_options(quota_options(true));
    sparse_file(&h.path("2020.06.24/old.mp4"), 210 * MIB);
    tokio::time::sleep(Duration::from_millis(50)).await;
    sparse_file(&h.path("2020.06.25/new.mp4"), MIB);

    h.recorder.start().await;
    assert!(h.recorder.is_recording());

    let events = h.events.until(EventKind::SpaceWiped).await;
    assert_eq!(count(&events, EventKind::SpaceFull), 1);
    assert_eq!(
        events.last().unwrap(),
        &RecorderEvent::SpaceWiped(SpaceUsage {
            path: h.recorder.config().destination.clone(),
            used: MIB,
            threshold: THRESHOLD,
        })
    );
    assert_eq!(count(&events, EventKind::Stop), 0);
    assert!(!h.path("2020.06.24").exists());
    assert!(h.path("2020.06.25/new.mp4").exists());
}

#[tokio::test]
async fn test_auto_clear_refuses_last_entry() {
    let mut h = TestHarness::with_options(quota_options(true));
    // The playlist is never a candidate, even when it is the oldest entry.
    sparse_file(&h.path("cam.m3u8"), 16);
    tokio::time::sleep(Duration::from_millis(50)).await;
    sparse_file(&h.path("2020.06.25/big.mp4"), 210 * MIB);

    h.recorder.start().await;

    let events = h.events.until(EventKind::Error).await;
    assert_eq!(
        events.last().unwrap(),
        &RecorderEvent::error(RecorderError::CannotRemoveCurrentDirectory)
    );
    assert_eq!(
        RecorderError::CannotRemoveCurrentDirectory.to_string(),
        "Can't remove current directory."
    );
    assert_eq!(count(&events, EventKind::SpaceWiped), 0);
    assert!(h.path("2020.06.25/big.mp4").exists());
    assert!(h.path("cam.m3u8").exists());
    assert!(h.recorder.is_recording());
}
