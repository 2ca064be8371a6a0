//! Public lifecycle events.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use super::config::StartedInfo;
use super::error::RecorderError;
use crate::quota::SpaceUsage;

/// Why a recording stopped (or is stopping).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// `stop()` was called.
    Programmatically,
    /// The storage quota was reached without auto-clear.
    SpaceFull,
    /// ffmpeg could not open a segment file.
    SegmentFailed,
    /// ffmpeg exited without being asked to.
    FfmpegExited,
    /// The process could not be started.
    SpawnFailed,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Programmatically => "programmatically",
            Self::SpaceFull => "space_full",
            Self::SegmentFailed => "segment_failed",
            Self::FfmpegExited => "ffmpeg_exited",
            Self::SpawnFailed => "spawn_failed",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a recorder reports to the outside world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecorderEvent {
    /// `start()` was called.
    Start { reason: String },
    /// ffmpeg announced its output; recording is live.
    Started(StartedInfo),
    /// ffmpeg opened a new segment.
    SegmentStarted {
        current: String,
        previous: Option<String>,
    },
    /// A segment reached its permanent path.
    FileCreated { path: PathBuf },
    /// A directory was created for a permanent segment path.
    DirectoryCreated { path: PathBuf },
    /// Unrecognized diagnostic line, verbatim.
    Progress { message: String },
    SpaceFull(SpaceUsage),
    /// Auto-clear removed the oldest entry; usage after removal.
    SpaceWiped(SpaceUsage),
    Stop { reason: StopReason },
    /// The process is gone. `code` is `None` when it never ran or was
    /// terminated by a signal.
    Stopped {
        code: Option<i32>,
        reason: StopReason,
    },
    Error { error: RecorderError },
}

/// Discriminant of [`RecorderEvent`], used to subscribe to one event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Start,
    Started,
    SegmentStarted,
    FileCreated,
    DirectoryCreated,
    Progress,
    SpaceFull,
    SpaceWiped,
    Stop,
    Stopped,
    Error,
}

impl RecorderEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Start { .. } => EventKind::Start,
            Self::Started(_) => EventKind::Started,
            Self::SegmentStarted { .. } => EventKind::SegmentStarted,
            Self::FileCreated { .. } => EventKind::FileCreated,
            Self::DirectoryCreated { .. } => EventKind::DirectoryCreated,
            Self::Progress { .. } => EventKind::Progress,
            Self::SpaceFull(_) => EventKind::SpaceFull,
            Self::SpaceWiped(_) => EventKind::SpaceWiped,
            Self::Stop { .. } => EventKind::Stop,
            Self::Stopped { .. } => EventKind::Stopped,
            Self::Error { .. } => EventKind::Error,
        }
    }

    pub fn error(error: RecorderError) -> Self {
        Self::Error { error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let event = RecorderEvent::Stopped {
            code: Some(255),
            reason: StopReason::Programmatically,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "stopped");
        assert_eq!(json["code"], 255);
        assert_eq!(json["reason"], "programmatically");

        let event = RecorderEvent::SpaceFull(SpaceUsage {
            path: PathBuf::from("/rec"),
            used: 496,
            threshold: 500,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "space_full");
        assert_eq!(json["used"], 496);

        let event = RecorderEvent::error(RecorderError::NoProcessSpawned);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["error"]["kind"], "no_process_spawned");
    }

    #[test]
    fn test_kind() {
        assert_eq!(
            RecorderEvent::Progress {
                message: "frame=1".into()
            }
            .kind(),
            EventKind::Progress
        );
        assert_eq!(
            RecorderEvent::error(RecorderError::AlreadySpawned).kind(),
            EventKind::Error
        );
    }

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(StopReason::SpaceFull.to_string(), "space_full");
        assert_eq!(StopReason::FfmpegExited.to_string(), "ffmpeg_exited");
    }
}
