//! Trait definitions for the transcoder module.

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::{mpsc, oneshot};

use super::error::TranscoderError;
use super::types::{LaunchSpec, ProcessEvent};

/// Starts transcoder processes.
///
/// Implementations own the OS-level details; the session only sees a
/// [`TranscoderHandle`] delivering [`ProcessEvent`]s.
#[async_trait]
pub trait TranscoderLauncher: Send + Sync {
    /// Returns the name of this launcher implementation.
    fn name(&self) -> &str;

    /// Checks that `program` can be executed.
    async fn validate(&self, program: &Path) -> Result<(), TranscoderError>;

    /// Starts a process. Must fail fast if the program cannot be started.
    async fn spawn(&self, spec: &LaunchSpec) -> Result<TranscoderHandle, TranscoderError>;
}

/// Handle to one running process.
///
/// Events arrive in the order the process produced them, and
/// [`ProcessEvent::Exited`] is always the last one.
#[derive(Debug)]
pub struct TranscoderHandle {
    pid: Option<u32>,
    events: mpsc::Receiver<ProcessEvent>,
    kill_tx: Option<oneshot::Sender<()>>,
}

impl TranscoderHandle {
    pub fn new(
        pid: Option<u32>,
        events: mpsc::Receiver<ProcessEvent>,
        kill_tx: oneshot::Sender<()>,
    ) -> Self {
        Self {
            pid,
            events,
            kill_tx: Some(kill_tx),
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Asks the process to terminate. Only the first call has an effect.
    ///
    /// Returns whether a request was actually sent.
    pub fn kill(&mut self) -> bool {
        match self.kill_tx.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    pub fn kill_requested(&self) -> bool {
        self.kill_tx.is_none()
    }

    /// Next process event, `None` once the process side is gone.
    pub async fn next_event(&mut self) -> Option<ProcessEvent> {
        self.events.recv().await
    }
}
