//! Session state.

use serde::Serialize;
use std::fmt;

use super::events::StopReason;
use crate::transcoder::TranscoderHandle;

/// Externally visible session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderStatus {
    Idle,
    /// `start()` accepted, quota check or spawn in progress.
    Starting,
    Recording,
    /// Termination requested, waiting for the process to exit.
    Stopping,
}

impl fmt::Display for RecorderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
        };
        f.write_str(s)
    }
}

/// The running transcoder and what the session knows about its output.
#[derive(Debug)]
pub(crate) struct ActiveProcess {
    pub handle: TranscoderHandle,
    /// Segment currently being written; finalized when the next one opens.
    pub previous_segment: Option<String>,
}

impl ActiveProcess {
    pub fn new(handle: TranscoderHandle) -> Self {
        Self {
            handle,
            previous_segment: None,
        }
    }
}

/// Internal state owned by the session loop. The process handle only
/// exists while recording or stopping.
///
/// `Draining` is the tail of a stop: the process is gone but segment moves
/// are still in flight, and `stopped` is held back until they finish.
#[derive(Debug, Default)]
pub(crate) enum SessionState {
    #[default]
    Idle,
    Recording(ActiveProcess),
    Stopping {
        process: ActiveProcess,
        reason: StopReason,
    },
    Draining {
        code: Option<i32>,
        reason: StopReason,
    },
}

impl SessionState {
    pub fn status(&self) -> RecorderStatus {
        match self {
            Self::Idle => RecorderStatus::Idle,
            Self::Recording(_) => RecorderStatus::Recording,
            Self::Stopping { .. } | Self::Draining { .. } => RecorderStatus::Stopping,
        }
    }

    pub fn process_mut(&mut self) -> Option<&mut ActiveProcess> {
        match self {
            Self::Idle | Self::Draining { .. } => None,
            Self::Recording(process) => Some(process),
            Self::Stopping { process, .. } => Some(process),
        }
    }
}
