//! Mock transcoder launcher for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::transcoder::{
    LaunchSpec, ProcessEvent, TranscoderError, TranscoderHandle, TranscoderLauncher,
    PROCESS_EVENT_BUFFER,
};

/// Exit code reported when a mock process is killed, as a shell reports
/// for an interrupted ffmpeg.
pub const MOCK_KILL_EXIT_CODE: i32 = 255;

/// Test-side control of one spawned mock process.
///
/// Lines pushed here reach the session exactly like ffmpeg's stderr.
#[derive(Debug, Clone)]
pub struct MockProcess {
    pid: u32,
    events: mpsc::Sender<ProcessEvent>,
    killed: Arc<AtomicBool>,
}

impl MockProcess {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Emits one diagnostic line.
    pub async fn emit_line(&self, line: impl Into<String>) {
        let _ = self.events.send(ProcessEvent::Output(line.into())).await;
    }

    /// Emits several diagnostic lines in order.
    pub async fn emit_lines<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for line in lines {
            self.emit_line(line).await;
        }
    }

    /// Emits a runtime process error.
    pub async fn emit_error(&self, reason: impl Into<String>) {
        let _ = self.events.send(ProcessEvent::Error(reason.into())).await;
    }

    /// Simulates the process exiting on its own.
    pub async fn exit(&self, code: Option<i32>) {
        let _ = self.events.send(ProcessEvent::Exited { code }).await;
    }

    /// Whether the session asked this process to terminate.
    pub fn was_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }
}

/// Mock implementation of the TranscoderLauncher trait.
///
/// Provides controllable behavior for testing:
/// - Record launch specs for assertions
/// - Script process output and exits through [`MockProcess`]
/// - Inject spawn failures
/// - Kill requests end the process with exit code 255
///
/// # Example
///
/// ```rust,ignore
/// use recorder_core::testing::MockLauncher;
///
/// let launcher = Arc::new(MockLauncher::new());
/// let recorder = Recorder::with_launcher(uri, dir, options, launcher.clone())?;
/// recorder.start().await;
///
/// let process = launcher.last_process().await.unwrap();
/// process.emit_line("Opening '2020.06.25/10.18.04.mp4' for writing").await;
/// ```
#[derive(Debug, Clone)]
pub struct MockLauncher {
    /// Recorded launch specs.
    spawns: Arc<RwLock<Vec<LaunchSpec>>>,
    /// Control handles of spawned processes, in spawn order.
    processes: Arc<RwLock<Vec<MockProcess>>>,
    /// If set, the next spawn fails with this reason.
    next_spawn_error: Arc<RwLock<Option<String>>>,
    /// Whether `validate` reports the binary as missing.
    binary_missing: Arc<AtomicBool>,
    next_pid: Arc<AtomicU32>,
}

impl Default for MockLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLauncher {
    /// Create a new mock launcher.
    pub fn new() -> Self {
        Self {
            spawns: Arc::new(RwLock::new(Vec::new())),
            processes: Arc::new(RwLock::new(Vec::new())),
            next_spawn_error: Arc::new(RwLock::new(None)),
            binary_missing: Arc::new(AtomicBool::new(false)),
            next_pid: Arc::new(AtomicU32::new(1000)),
        }
    }

    /// Get all recorded launch specs.
    pub async fn spawned(&self) -> Vec<LaunchSpec> {
        self.spawns.read().await.clone()
    }

    /// Get the number of successful spawns.
    pub async fn spawn_count(&self) -> usize {
        self.spawns.read().await.len()
    }

    /// Control handle of the most recently spawned process.
    pub async fn last_process(&self) -> Option<MockProcess> {
        self.processes.read().await.last().cloned()
    }

    /// Control handles of every spawned process.
    pub async fn processes(&self) -> Vec<MockProcess> {
        self.processes.read().await.clone()
    }

    /// Make the next spawn fail.
    pub async fn fail_next_spawn(&self, reason: impl Into<String>) {
        *self.next_spawn_error.write().await = Some(reason.into());
    }

    /// Make `validate` report the binary as missing.
    pub fn set_binary_missing(&self, missing: bool) {
        self.binary_missing.store(missing, Ordering::SeqCst);
    }
}

#[async_trait]
impl TranscoderLauncher for MockLauncher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn validate(&self, program: &Path) -> Result<(), TranscoderError> {
        if self.binary_missing.load(Ordering::SeqCst) {
            return Err(TranscoderError::NotFound {
                path: PathBuf::from(program),
            });
        }
        Ok(())
    }

    async fn spawn(&self, spec: &LaunchSpec) -> Result<TranscoderHandle, TranscoderError> {
        if let Some(reason) = self.next_spawn_error.write().await.take() {
            return Err(TranscoderError::spawn_failed(reason));
        }

        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        let (event_tx, event_rx) = mpsc::channel(PROCESS_EVENT_BUFFER);
        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        let killed = Arc::new(AtomicBool::new(false));

        let process = MockProcess {
            pid,
            events: event_tx.clone(),
            killed: Arc::clone(&killed),
        };

        tokio::spawn(async move {
            if kill_rx.await.is_ok() {
                killed.store(true, Ordering::SeqCst);
                let _ = event_tx
                    .send(ProcessEvent::Exited {
                        code: Some(MOCK_KILL_EXIT_CODE),
                    })
                    .await;
            }
        });

        self.spawns.write().await.push(spec.clone());
        self.processes.write().await.push(process);

        Ok(TranscoderHandle::new(Some(pid), event_rx, kill_tx))
    }
}
