//! FFmpeg process launcher.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::error::TranscoderError;
use super::lines::LineSplitter;
use super::traits::{TranscoderHandle, TranscoderLauncher};
use super::types::{LaunchSpec, ProcessEvent};

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// How long a drain after exit waits for more output before giving up.
const DRAIN_IDLE_TIMEOUT: Duration = Duration::from_millis(500);

/// Capacity of the per-process event channel.
pub const PROCESS_EVENT_BUFFER: usize = 256;

/// Launches real ffmpeg processes.
#[derive(Debug, Clone, Default)]
pub struct FfmpegLauncher;

impl FfmpegLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TranscoderLauncher for FfmpegLauncher {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn validate(&self, program: &Path) -> Result<(), TranscoderError> {
        let output = Command::new(program)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| TranscoderError::from_spawn_io(program, e))?;

        if !output.status.success() {
            return Err(TranscoderError::VersionCheckFailed {
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let banner = String::from_utf8_lossy(&output.stdout);
        if let Some(first_line) = banner.lines().next() {
            info!("Using {}", first_line);
        }
        Ok(())
    }

    async fn spawn(&self, spec: &LaunchSpec) -> Result<TranscoderHandle, TranscoderError> {
        debug!(
            "Spawning {} with args: {:?} in {:?}",
            spec.program.display(),
            spec.args,
            spec.cwd
        );

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TranscoderError::from_spawn_io(&spec.program, e))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TranscoderError::spawn_failed("stderr was not captured"))?;

        let pid = child.id();
        info!("Spawned {} (pid {:?})", spec.program.display(), pid);

        let (event_tx, event_rx) = mpsc::channel(PROCESS_EVENT_BUFFER);
        let (kill_tx, kill_rx) = oneshot::channel();
        tokio::spawn(supervise(child, stderr, event_tx, kill_rx));

        Ok(TranscoderHandle::new(pid, event_rx, kill_tx))
    }
}

/// Relays stderr lines, honors the kill request and reports the exit.
///
/// A dropped handle counts as a kill request, so the process never outlives
/// its session.
async fn supervise(
    mut child: Child,
    mut stderr: ChildStderr,
    events: mpsc::Sender<ProcessEvent>,
    mut kill_rx: oneshot::Receiver<()>,
) {
    let mut splitter = LineSplitter::default();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut kill_requested = false;
    let mut eof = false;

    let code = loop {
        tokio::select! {
            biased;

            _ = &mut kill_rx, if !kill_requested => {
                kill_requested = true;
                debug!("Kill requested for pid {:?}", child.id());
                if let Err(e) = child.start_kill() {
                    // Already exited; the wait branch collects the status.
                    debug!("start_kill failed: {}", e);
                }
            }
            read = stderr.read(&mut buf), if !eof => match read {
                Ok(0) => eof = true,
                Ok(n) => relay_lines(&events, splitter.push(&buf[..n])).await,
                Err(e) => {
                    warn!("Failed to read transcoder output: {}", e);
                    eof = true;
                    let _ = events.send(ProcessEvent::Error(e.to_string())).await;
                }
            },
            // Pending output is read before the exit is collected. After a
            // kill the exit no longer waits for EOF, since an inherited
            // stderr may stay open in a grandchild.
            status = child.wait(), if eof || kill_requested => {
                break match status {
                    Ok(status) => status.code(),
                    Err(e) => {
                        warn!("Failed to collect transcoder exit status: {}", e);
                        let _ = events.send(ProcessEvent::Error(e.to_string())).await;
                        None
                    }
                };
            }
        }
    };

    if !eof {
        drain(&mut stderr, &mut splitter, &mut buf, &events).await;
    }
    if let Some(line) = splitter.finish() {
        let _ = events.send(ProcessEvent::Output(line)).await;
    }

    info!("Transcoder exited with code {:?}", code);
    let _ = events.send(ProcessEvent::Exited { code }).await;
}

/// Reads whatever the exited process left in the pipe, up to EOF.
///
/// Gives up once no data arrives for [`DRAIN_IDLE_TIMEOUT`], which happens
/// when a grandchild still holds the write end open.
async fn drain(
    stderr: &mut ChildStderr,
    splitter: &mut LineSplitter,
    buf: &mut [u8],
    events: &mpsc::Sender<ProcessEvent>,
) {
    loop {
        match tokio::time::timeout(DRAIN_IDLE_TIMEOUT, stderr.read(buf)).await {
            Ok(Ok(0)) => return,
            Ok(Ok(n)) => relay_lines(events, splitter.push(&buf[..n])).await,
            Ok(Err(e)) => {
                warn!("Failed to drain transcoder output: {}", e);
                return;
            }
            Err(_) => {
                debug!("Transcoder output still open after exit, giving up");
                return;
            }
        }
    }
}

async fn relay_lines(events: &mpsc::Sender<ProcessEvent>, lines: Vec<String>) {
    for line in lines {
        let _ = events.send(ProcessEvent::Output(line)).await;
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn sh(script: &str, cwd: &Path) -> LaunchSpec {
        LaunchSpec {
            program: PathBuf::from("sh"),
            args: vec!["-c".into(), script.into()],
            cwd: cwd.to_path_buf(),
        }
    }

    async fn collect(mut handle: TranscoderHandle) -> Vec<ProcessEvent> {
        let mut events = Vec::new();
        while let Some(event) = handle.next_event().await {
            let done = matches!(event, ProcessEvent::Exited { .. });
            events.push(event);
            if done {
                break;
            }
        }
        events
    }

    #[tokio::test]
    async fn test_relays_stderr_lines_and_exit_code() {
        let dir = TempDir::new().unwrap();
        let launcher = FfmpegLauncher::new();
        let handle = launcher
            .spawn(&sh("printf 'one\\ntwo\\rthree' >&2; exit 3", dir.path()))
            .await
            .unwrap();

        assert!(handle.pid().is_some());
        assert_eq!(
            collect(handle).await,
            vec![
                ProcessEvent::Output("one".into()),
                ProcessEvent::Output("two".into()),
                ProcessEvent::Output("three".into()),
                ProcessEvent::Exited { code: Some(3) },
            ]
        );
    }

    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let dir = TempDir::new().unwrap();
        let launcher = FfmpegLauncher::new();
        let handle = launcher
            .spawn(&sh("touch marker", dir.path()))
            .await
            .unwrap();

        collect(handle).await;
        assert!(dir.path().join("marker").exists());
    }

    #[tokio::test]
    async fn test_kill_terminates_process() {
        let dir = TempDir::new().unwrap();
        let launcher = FfmpegLauncher::new();
        let mut handle = launcher.spawn(&sh("exec sleep 30", dir.path())).await.unwrap();

        assert!(handle.kill());
        assert!(!handle.kill());

        let events = tokio::time::timeout(std::time::Duration::from_secs(5), collect(handle))
            .await
            .unwrap();
        // SIGKILL leaves no exit code.
        assert_eq!(events, vec![ProcessEvent::Exited { code: None }]);
    }

    #[tokio::test]
    async fn test_kill_delivers_output_written_before_it() {
        const LINES: usize = 2000;
        let script = format!(
            "i=0; while [ $i -lt {LINES} ]; do echo \"line $i\" >&2; i=$((i+1)); done; exec sleep 30"
        );

        for _ in 0..5 {
            let dir = TempDir::new().unwrap();
            let launcher = FfmpegLauncher::new();
            let mut handle = launcher.spawn(&sh(&script, dir.path())).await.unwrap();

            // Let the output pile up unread before asking for the kill.
            tokio::time::sleep(std::time::Duration::from_millis(700)).await;
            assert!(handle.kill());

            let events =
                tokio::time::timeout(std::time::Duration::from_secs(10), collect(handle))
                    .await
                    .unwrap();
            let lines: Vec<_> = events
                .iter()
                .filter_map(|event| match event {
                    ProcessEvent::Output(line) => Some(line.as_str()),
                    _ => None,
                })
                .collect();

            assert_eq!(lines.len(), LINES);
            assert_eq!(lines[0], "line 0");
            assert_eq!(lines[LINES - 1], format!("line {}", LINES - 1));
            assert_eq!(events.last(), Some(&ProcessEvent::Exited { code: None }));
        }
    }

    #[tokio::test]
    async fn test_kill_does_not_wait_for_grandchild_output() {
        let dir = TempDir::new().unwrap();
        let launcher = FfmpegLauncher::new();
        let mut handle = launcher
            .spawn(&sh("echo ready >&2; sleep 3 & exec sleep 30", dir.path()))
            .await
            .unwrap();

        assert_eq!(
            handle.next_event().await,
            Some(ProcessEvent::Output("ready".into()))
        );
        assert!(handle.kill());

        // The background sleep keeps stderr open well past this deadline.
        let events = tokio::time::timeout(std::time::Duration::from_secs(2), collect(handle))
            .await
            .unwrap();
        assert_eq!(events, vec![ProcessEvent::Exited { code: None }]);
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let dir = TempDir::new().unwrap();
        let launcher = FfmpegLauncher::new();
        let spec = LaunchSpec {
            program: PathBuf::from("/nonexistent/ffmpeg"),
            args: vec![],
            cwd: dir.path().to_path_buf(),
        };

        let err = launcher.spawn(&spec).await.unwrap_err();
        assert!(matches!(err, TranscoderError::NotFound { .. }));

        let err = launcher.validate(&spec.program).await.unwrap_err();
        assert!(matches!(err, TranscoderError::NotFound { .. }));
    }
}
