//! Router tests for the recording control API.

mod common;

use axum::http::StatusCode;
use common::{fixtures, TestFixture};
use recorder_core::{RecorderError, RecorderStatus};

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/health").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_redacts_stream_credentials() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/config").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(
        response.body["recorder"]["uri"],
        "rtsp://***@camera.local:554/stream"
    );
    assert_eq!(response.body["recorder"]["playlist_name"], "cam");
    assert!(!response.text.contains("hunter2"));
}

#[tokio::test]
async fn test_status_when_idle() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/status").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "idle");
    assert_eq!(response.body["recording"], false);
    assert_eq!(response.body["playlist"], "cam.m3u8");
    assert!(!response.text.contains("hunter2"));
}

#[tokio::test]
async fn test_start_spawns_transcoder() {
    let fixture = TestFixture::new();

    let response = fixture.post("/api/v1/start").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "recording");
    assert_eq!(response.body["recording"], true);
    assert_eq!(fixture.launcher.spawn_count().await, 1);

    let spawned = fixture.launcher.spawned().await;
    assert_eq!(spawned[0].cwd, fixture.temp_dir.path());
    assert!(spawned[0].args.contains(&common::SECRET_URI.to_string()));
}

#[tokio::test]
async fn test_start_twice_conflicts() {
    let fixture = TestFixture::new();
    fixture.post("/api/v1/start").await;

    let response = fixture.post("/api/v1/start").await;

    assert_status!(response, StatusCode::CONFLICT);
    assert_eq!(
        response.body["error"],
        RecorderError::AlreadySpawned.to_string()
    );
    assert_eq!(fixture.launcher.spawn_count().await, 1);
    assert!(fixture.recorder.is_recording());
}

#[tokio::test]
async fn test_concurrent_starts_accept_exactly_one() {
    let fixture = TestFixture::new();

    let (first, second) = tokio::join!(
        fixture.post("/api/v1/start"),
        fixture.post("/api/v1/start")
    );

    let mut statuses = vec![first.status, second.status];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);
    assert_eq!(fixture.launcher.spawn_count().await, 1);
}

#[tokio::test]
async fn test_stop_without_recording_conflicts() {
    let fixture = TestFixture::new();

    let response = fixture.post("/api/v1/stop").await;

    assert_status!(response, StatusCode::CONFLICT);
    assert_eq!(
        response.body["error"],
        RecorderError::NoProcessSpawned.to_string()
    );
}

#[tokio::test]
async fn test_start_then_stop() {
    let fixture = TestFixture::new();
    fixture.post("/api/v1/start").await;

    let response = fixture.post("/api/v1/stop").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["recording"], false);

    fixture.recorder.wait_until_idle().await;
    assert!(fixture.process().await.was_killed());
    let response = fixture.get("/api/v1/status").await;
    assert_eq!(response.body["status"], "idle");
}

#[tokio::test]
async fn test_status_follows_unexpected_exit() {
    let fixture = TestFixture::new();
    fixture.post("/api/v1/start").await;

    let process = fixture.process().await;
    process.emit_line(fixtures::progress()).await;
    process.exit(Some(1)).await;
    fixture.recorder.wait_until_idle().await;

    let response = fixture.get("/api/v1/status").await;
    assert_eq!(response.body["status"], "idle");
    assert_eq!(fixture.recorder.status(), RecorderStatus::Idle);

    // A fresh start is accepted after the process died.
    let response = fixture.post("/api/v1/start").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(fixture.launcher.spawn_count().await, 2);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.post("/api/v1/start").await;
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;

    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("recorder_recording 1"));
    assert!(response.text.contains("recorder_http_requests_total"));
    assert!(response.text.contains("recorder_transcoder_spawns_total"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/recordings").await;

    assert_status!(response, StatusCode::NOT_FOUND);
}
