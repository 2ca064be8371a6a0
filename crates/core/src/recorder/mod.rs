//! Recording session.
//!
//! A [`Recorder`] is a cheap, cloneable handle to one session loop running on
//! the Tokio runtime. The loop owns the transcoder process, turns its output
//! into [`RecorderEvent`]s, finalizes segments and enforces the storage
//! quota. `start()` and `stop()` never fail; problems are delivered as
//! [`EventKind::Error`] events, so a caller that does not listen for errors
//! does not see them.
//!
//! ```ignore
//! let recorder = Recorder::new("rtsp://cam/stream", "/srv/rec", RecorderOptions::default())?;
//! recorder.on(EventKind::FileCreated, |event| println!("{:?}", event));
//! recorder.start().await;
//! ```

mod config;
mod emitter;
mod error;
mod events;
mod segment;
mod session;
mod state;

pub use config::{RecorderConfig, StartedInfo, DEFAULT_FFMPEG_BINARY, DEFAULT_SEGMENT_TIME_SECS};
pub use emitter::{EventBus, Listener, ListenerId, EVENT_BROADCAST_CAPACITY};
pub use error::{RecorderError, RecorderValidationError};
pub use events::{EventKind, RecorderEvent, StopReason};
pub use segment::{segment_target, SegmentTarget, TEMP_MARKER};
pub use state::RecorderStatus;

use std::path::Path;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::warn;

use crate::options::RecorderOptions;
use crate::transcoder::{FfmpegLauncher, TranscoderLauncher};
use session::{Command, CommandResult, Session};

const COMMAND_BUFFER: usize = 32;

/// Handle to a recording session.
///
/// Must be created inside a Tokio runtime. The session loop ends when the
/// last clone is dropped; a running process is killed at that point.
#[derive(Clone)]
pub struct Recorder {
    config: Arc<RecorderConfig>,
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<RecorderStatus>,
    bus: Arc<EventBus>,
}

impl Recorder {
    /// Creates a recorder driving the system `ffmpeg` (or
    /// [`RecorderOptions::ffmpeg_binary`]).
    pub fn new(
        uri: impl Into<String>,
        destination: impl AsRef<Path>,
        options: RecorderOptions,
    ) -> Result<Self, RecorderValidationError> {
        Self::with_launcher(uri, destination, options, Arc::new(FfmpegLauncher::new()))
    }

    /// Creates a recorder with a custom process launcher.
    pub fn with_launcher(
        uri: impl Into<String>,
        destination: impl AsRef<Path>,
        options: RecorderOptions,
        launcher: Arc<dyn TranscoderLauncher>,
    ) -> Result<Self, RecorderValidationError> {
        let config = RecorderConfig::resolve(uri, destination, options)?;
        Ok(Self::from_config(config, launcher))
    }

    /// Creates a recorder from an already resolved configuration.
    pub fn from_config(config: RecorderConfig, launcher: Arc<dyn TranscoderLauncher>) -> Self {
        let config = Arc::new(config);
        let bus = Arc::new(EventBus::new());
        let (status_tx, status) = watch::channel(RecorderStatus::Idle);
        let (commands, command_rx) = mpsc::channel(COMMAND_BUFFER);

        let session = Session::new(Arc::clone(&config), launcher, Arc::clone(&bus), status_tx);
        tokio::spawn(session.run(command_rx));

        Self {
            config,
            commands,
            status,
            bus,
        }
    }

    /// Starts recording. Resolves once the session has either spawned the
    /// transcoder or given up; failures arrive as events.
    pub async fn start(&self) -> &Self {
        let _ = self.send(Command::Start).await;
        self
    }

    /// Like [`Recorder::start`], but also hands back the rejection when the
    /// session was not idle. The `error` event is emitted either way.
    pub async fn try_start(&self) -> Result<(), RecorderError> {
        self.send(Command::Start).await
    }

    /// Requests termination. Resolves once the session is stopping; the
    /// `stopped` event follows when the process has exited.
    pub async fn stop(&self) -> &Self {
        let _ = self.send(Command::Stop).await;
        self
    }

    /// Like [`Recorder::stop`], but also hands back the rejection when
    /// nothing was recording. The `error` event is emitted either way.
    pub async fn try_stop(&self) -> Result<(), RecorderError> {
        self.send(Command::Stop).await
    }

    async fn send(
        &self,
        command: impl FnOnce(oneshot::Sender<CommandResult>) -> Command,
    ) -> CommandResult {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.commands.send(command(ack_tx)).await.is_err() {
            warn!("Session loop is gone, command dropped");
            return Ok(());
        }
        ack_rx.await.unwrap_or(Ok(()))
    }

    /// Registers a listener for one event kind.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&RecorderEvent) + Send + Sync + 'static,
    {
        self.bus.on(kind, listener)
    }

    pub fn remove_listener(&self, kind: EventKind, id: ListenerId) -> bool {
        self.bus.remove_listener(kind, id)
    }

    /// Stream of every event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<RecorderEvent> {
        self.bus.subscribe()
    }

    pub fn is_recording(&self) -> bool {
        self.status() == RecorderStatus::Recording
    }

    pub fn status(&self) -> RecorderStatus {
        *self.status.borrow()
    }

    /// Status updates, for callers that want to await transitions.
    pub fn watch_status(&self) -> watch::Receiver<RecorderStatus> {
        self.status.clone()
    }

    /// Waits until the session is idle, i.e. any stop has fully completed.
    pub async fn wait_until_idle(&self) {
        let mut status = self.status.clone();
        let _ = status.wait_for(|s| *s == RecorderStatus::Idle).await;
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("uri", &crate::config::redact_uri_credentials(&self.config.uri))
            .field("destination", &self.config.destination)
            .field("status", &self.status())
            .finish()
    }
}
