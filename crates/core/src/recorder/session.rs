//! The session loop.
//!
//! One task owns all state of a recorder and handles commands, process
//! events and finalize outcomes one at a time, in arrival order.

use futures::stream::{FuturesOrdered, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

use super::config::{RecorderConfig, StartedInfo};
use super::emitter::EventBus;
use super::error::RecorderError;
use super::events::{RecorderEvent, StopReason};
use super::segment::{finalize_segment, FinalizeOutcome};
use super::state::{ActiveProcess, RecorderStatus, SessionState};
use crate::config::redact_uri_credentials;
use crate::metrics;
use crate::parser::{classify_line, OutputSignal};
use crate::quota::{dir_size, exceeds_threshold, remove_oldest_entry, SpaceUsage, WipeError};
use crate::transcoder::{launch_spec, ProcessEvent, TranscoderLauncher};

/// Requests from a [`super::Recorder`] handle. The sender is acked once the
/// resulting state transition has been applied, with the rejection if the
/// session was in the wrong state for it.
#[derive(Debug)]
pub(crate) enum Command {
    Start(oneshot::Sender<CommandResult>),
    Stop(oneshot::Sender<CommandResult>),
}

pub(crate) type CommandResult = Result<(), RecorderError>;

enum QuotaVerdict {
    Enough,
    Full,
}

pub(crate) struct Session {
    config: Arc<RecorderConfig>,
    launcher: Arc<dyn TranscoderLauncher>,
    bus: Arc<EventBus>,
    status_tx: watch::Sender<RecorderStatus>,
    state: SessionState,
    finalizing: FuturesOrdered<JoinHandle<FinalizeOutcome>>,
    known_dirs: HashSet<PathBuf>,
}

impl Session {
    pub(crate) fn new(
        config: Arc<RecorderConfig>,
        launcher: Arc<dyn TranscoderLauncher>,
        bus: Arc<EventBus>,
        status_tx: watch::Sender<RecorderStatus>,
    ) -> Self {
        Self {
            config,
            launcher,
            bus,
            status_tx,
            state: SessionState::Idle,
            finalizing: FuturesOrdered::new(),
            known_dirs: HashSet::new(),
        }
    }

    /// Runs until every [`super::Recorder`] handle is dropped.
    pub(crate) async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        debug!("Session loop started for {}", redact_uri_credentials(&self.config.uri));

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                event = next_process_event(&mut self.state) => {
                    self.handle_process_event(event).await;
                }
                Some(joined) = self.finalizing.next(), if !self.finalizing.is_empty() => {
                    self.handle_finalized(joined);
                }
            }
        }

        self.shutdown().await;
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start(ack) => {
                let result = match self.state {
                    SessionState::Idle => Ok(()),
                    _ => Err(RecorderError::AlreadySpawned),
                };
                self.start().await;
                let _ = ack.send(result);
            }
            Command::Stop(ack) => {
                let result = if self.is_recording() {
                    Ok(())
                } else {
                    Err(RecorderError::NoProcessSpawned)
                };
                self.stop(StopReason::Programmatically);
                let _ = ack.send(result);
            }
        }
    }

    async fn start(&mut self) {
        self.bus.emit(RecorderEvent::Start {
            reason: StopReason::Programmatically.to_string(),
        });

        if !matches!(self.state, SessionState::Idle) {
            self.report(RecorderError::AlreadySpawned);
            return;
        }

        self.status_tx.send_replace(RecorderStatus::Starting);

        if let QuotaVerdict::Full = self.check_quota().await {
            info!("Not starting, destination {:?} is full", self.config.destination);
            self.finish_stop(None, StopReason::SpaceFull);
            return;
        }

        let spec = launch_spec(&self.config);
        match self.launcher.spawn(&spec).await {
            Ok(handle) => {
                metrics::TRANSCODER_SPAWNS
                    .with_label_values(&["success"])
                    .inc();
                info!(
                    "Recording {} into {:?} (pid {:?})",
                    redact_uri_credentials(&self.config.uri),
                    self.config.destination,
                    handle.pid()
                );
                self.state = SessionState::Recording(ActiveProcess::new(handle));
                self.publish_status();
            }
            Err(e) => {
                metrics::TRANSCODER_SPAWNS
                    .with_label_values(&["failure"])
                    .inc();
                self.report(RecorderError::SpawnFailed {
                    binary: spec.program,
                    reason: e.to_string(),
                });
                self.finish_stop(None, StopReason::SpawnFailed);
            }
        }
    }

    /// Requests termination. Only a recording session can be stopped; the
    /// `stopped` event follows once the process has exited.
    fn stop(&mut self, reason: StopReason) {
        self.bus.emit(RecorderEvent::Stop { reason });

        match std::mem::take(&mut self.state) {
            SessionState::Recording(mut process) => {
                info!("Stopping recording ({})", reason);
                process.handle.kill();
                if let Some(segment) = process.previous_segment.take() {
                    self.queue_finalize(segment);
                }
                self.state = SessionState::Stopping { process, reason };
                self.publish_status();
            }
            other => {
                self.state = other;
                self.report(RecorderError::NoProcessSpawned);
            }
        }
    }

    async fn handle_process_event(&mut self, event: ProcessEvent) {
        match event {
            ProcessEvent::Output(line) => self.handle_line(line).await,
            ProcessEvent::Error(reason) => self.report(RecorderError::ProcessFailed { reason }),
            ProcessEvent::Exited { code } => self.handle_exit(code),
        }
    }

    async fn handle_line(&mut self, line: String) {
        match classify_line(&line) {
            OutputSignal::Opening(path) => self.segment_opened(path).await,
            OutputSignal::Failed(path) => {
                self.report(RecorderError::SegmentFailed { path });
                if self.is_recording() {
                    self.stop(StopReason::SegmentFailed);
                }
            }
            OutputSignal::OutputStarted(playlist) => {
                info!("Transcoder writing playlist {}", playlist);
                self.bus.emit(RecorderEvent::Started(StartedInfo {
                    config: (*self.config).clone(),
                    playlist,
                }));
            }
            OutputSignal::NoMatch => self.bus.emit(RecorderEvent::Progress { message: line }),
        }
    }

    async fn segment_opened(&mut self, current: String) {
        let Some(process) = self.state.process_mut() else {
            return;
        };
        let previous = process.previous_segment.replace(current.clone());

        debug!("Segment opened: {}", current);
        metrics::SEGMENTS_STARTED.inc();
        self.bus.emit(RecorderEvent::SegmentStarted {
            current,
            previous: previous.clone(),
        });

        if let Some(previous) = previous {
            self.queue_finalize(previous);
        }

        if self.is_recording() {
            if let QuotaVerdict::Full = self.check_quota().await {
                self.stop(StopReason::SpaceFull);
            }
        }
    }

    fn handle_exit(&mut self, code: Option<i32>) {
        match std::mem::take(&mut self.state) {
            SessionState::Stopping {
                mut process,
                reason,
            } => {
                // A segment may have opened between the kill and the exit.
                if let Some(segment) = process.previous_segment.take() {
                    self.queue_finalize(segment);
                }
                self.enter_draining(code, reason);
            }
            SessionState::Recording(mut process) => {
                self.report(RecorderError::ProcessExited { code });
                if let Some(segment) = process.previous_segment.take() {
                    self.queue_finalize(segment);
                }
                self.enter_draining(code, StopReason::FfmpegExited);
            }
            other => self.state = other,
        }
    }

    fn enter_draining(&mut self, code: Option<i32>, reason: StopReason) {
        if self.finalizing.is_empty() {
            self.finish_stop(code, reason);
        } else {
            debug!(
                "Process exited, waiting for {} segment move(s)",
                self.finalizing.len()
            );
            self.state = SessionState::Draining { code, reason };
            self.publish_status();
        }
    }

    fn finish_stop(&mut self, code: Option<i32>, reason: StopReason) {
        self.state = SessionState::Idle;
        self.publish_status();
        metrics::SESSIONS_STOPPED
            .with_label_values(&[reason.as_str()])
            .inc();
        info!("Recording stopped ({}, code {:?})", reason, code);
        self.bus.emit(RecorderEvent::Stopped { code, reason });
    }

    fn queue_finalize(&mut self, segment: String) {
        let destination = self.config.destination.clone();
        let file_pattern = self.config.file_pattern.clone();
        self.finalizing
            .push_back(tokio::spawn(finalize_segment(destination, file_pattern, segment)));
    }

    fn handle_finalized(&mut self, joined: Result<FinalizeOutcome, JoinError>) {
        match joined {
            Ok(outcome) => {
                let elapsed = outcome.elapsed.as_secs_f64();
                match outcome.result {
                    Ok(finalized) => {
                        metrics::SEGMENTS_FINALIZED
                            .with_label_values(&["success"])
                            .inc();
                        metrics::FINALIZE_DURATION
                            .with_label_values(&["success"])
                            .observe(elapsed);

                        if let Some(dir) = finalized.created_dir {
                            if self.known_dirs.insert(dir.clone()) {
                                self.bus.emit(RecorderEvent::DirectoryCreated { path: dir });
                            }
                        }
                        self.bus.emit(RecorderEvent::FileCreated {
                            path: finalized.path,
                        });
                    }
                    Err(e) => {
                        metrics::SEGMENTS_FINALIZED
                            .with_label_values(&["failure"])
                            .inc();
                        metrics::FINALIZE_DURATION
                            .with_label_values(&["failure"])
                            .observe(elapsed);
                        warn!("Failed to finalize segment {}", outcome.segment);
                        self.report(e);
                    }
                }
            }
            Err(e) => error!("Finalize task failed: {}", e),
        }

        if self.finalizing.is_empty() {
            if let SessionState::Draining { code, reason } = self.state {
                self.finish_stop(code, reason);
            }
        }
    }

    /// Measures the destination and applies the quota policy.
    ///
    /// Measurement failures are reported and count as enough space.
    async fn check_quota(&mut self) -> QuotaVerdict {
        let Some(threshold) = self.config.dir_size_threshold else {
            return QuotaVerdict::Enough;
        };
        let destination = self.config.destination.clone();

        let Some(used) = self.measure(&destination).await else {
            return QuotaVerdict::Enough;
        };
        if !exceeds_threshold(used, threshold) {
            return QuotaVerdict::Enough;
        }

        warn!(
            "Destination {:?} is full: {} of {} bytes used",
            destination, used, threshold
        );
        metrics::SPACE_FULL_TOTAL.inc();
        self.bus.emit(RecorderEvent::SpaceFull(SpaceUsage {
            path: destination.clone(),
            used,
            threshold,
        }));

        if !self.config.auto_clear {
            return QuotaVerdict::Full;
        }

        let keep = [self.config.playlist_path()];
        match remove_oldest_entry(&destination, &keep).await {
            Ok(removed) => {
                metrics::SPACE_WIPED_TOTAL.inc();
                if let Some(used) = self.measure(&destination).await {
                    info!("Removed {:?}, {} bytes now used", removed, used);
                    self.bus.emit(RecorderEvent::SpaceWiped(SpaceUsage {
                        path: destination,
                        used,
                        threshold,
                    }));
                }
            }
            Err(WipeError::OnlyCurrentEntry) => {
                self.report(RecorderError::CannotRemoveCurrentDirectory);
            }
            Err(WipeError::Io { path, source }) => {
                self.report(RecorderError::WipeFailed {
                    path,
                    reason: source.to_string(),
                });
            }
        }

        QuotaVerdict::Enough
    }

    async fn measure(&self, destination: &Path) -> Option<u64> {
        match dir_size(destination).await {
            Ok(used) => {
                metrics::DESTINATION_BYTES.set(i64::try_from(used).unwrap_or(i64::MAX));
                Some(used)
            }
            Err(e) => {
                self.report(RecorderError::QuotaFailed {
                    path: destination.to_path_buf(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    fn report(&self, error: RecorderError) {
        metrics::RECORDER_ERRORS
            .with_label_values(&[error.kind()])
            .inc();
        warn!("Recorder error: {}", error);
        self.bus.emit(RecorderEvent::error(error));
    }

    fn is_recording(&self) -> bool {
        matches!(self.state, SessionState::Recording(_))
    }

    fn publish_status(&self) {
        self.status_tx.send_replace(self.state.status());
    }

    /// Kills a running process and lets pending segment moves finish.
    async fn shutdown(mut self) {
        debug!("All recorder handles dropped, shutting down session");

        let pending = self.state.process_mut().and_then(|process| {
            process.handle.kill();
            process.previous_segment.take()
        });
        if let Some(segment) = pending {
            self.queue_finalize(segment);
        }

        while let Some(joined) = self.finalizing.next().await {
            self.handle_finalized(joined);
        }
    }
}

/// Next event of the active process; never resolves without one.
async fn next_process_event(state: &mut SessionState) -> ProcessEvent {
    match state.process_mut() {
        Some(process) => process
            .handle
            .next_event()
            .await
            .unwrap_or(ProcessEvent::Exited { code: None }),
        None => std::future::pending().await,
    }
}
