//! Recording control handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use recorder_core::{config::redact_uri_credentials, Recorder, RecorderError, RecorderStatus};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Recorder status response
#[derive(Debug, Serialize)]
pub struct RecorderStatusResponse {
    pub status: RecorderStatus,
    /// Whether the transcoder is running and recording
    pub recording: bool,
    /// Stream URI with credentials redacted
    pub uri: String,
    pub destination: PathBuf,
    /// Playlist file name inside the destination
    pub playlist: String,
}

impl From<&Recorder> for RecorderStatusResponse {
    fn from(recorder: &Recorder) -> Self {
        let config = recorder.config();
        Self {
            status: recorder.status(),
            recording: recorder.is_recording(),
            uri: redact_uri_credentials(&config.uri),
            destination: config.destination.clone(),
            playlist: config.playlist_file_name(),
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct RecorderErrorResponse {
    pub error: String,
}

pub type Conflict = (StatusCode, Json<RecorderErrorResponse>);

fn conflict(error: RecorderError) -> Conflict {
    (
        StatusCode::CONFLICT,
        Json(RecorderErrorResponse {
            error: error.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Get recorder status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<RecorderStatusResponse> {
    Json(RecorderStatusResponse::from(state.recorder()))
}

/// Start recording.
///
/// The request is always forwarded to the session so subscribers see the
/// `start` event; a session that was not idle when the request reached it
/// answers 409.
pub async fn start(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RecorderStatusResponse>, Conflict> {
    let recorder = state.recorder();
    recorder.try_start().await.map_err(conflict)?;
    Ok(Json(RecorderStatusResponse::from(recorder)))
}

/// Stop recording.
///
/// Returns once the transcoder has been told to exit; the `stopped` event
/// on `/events` marks the end of the session.
pub async fn stop(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RecorderStatusResponse>, Conflict> {
    let recorder = state.recorder();
    recorder.try_stop().await.map_err(conflict)?;
    Ok(Json(RecorderStatusResponse::from(recorder)))
}
