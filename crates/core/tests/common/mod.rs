//! Shared helpers for recorder integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::broadcast;

use recorder_core::{
    testing::{fixtures, MockLauncher, MockProcess},
    EventKind, Recorder, RecorderEvent, RecorderOptions,
};

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Ordered view of everything a recorder emits.
pub struct EventStream {
    rx: broadcast::Receiver<RecorderEvent>,
}

impl EventStream {
    pub async fn next(&mut self) -> RecorderEvent {
        tokio::time::timeout(EVENT_TIMEOUT, self.rx.recv())
            .await
            .expect("Timed out waiting for an event")
            .expect("Event stream closed")
    }

    /// Skips events until one of `kind` arrives.
    pub async fn next_of(&mut self, kind: EventKind) -> RecorderEvent {
        loop {
            let event = self.next().await;
            if event.kind() == kind {
                return event;
            }
        }
    }

    /// Every event up to and including the first one of `kind`.
    pub async fn until(&mut self, kind: EventKind) -> Vec<RecorderEvent> {
        let mut events = Vec::new();
        loop {
            let event = self.next().await;
            let done = event.kind() == kind;
            events.push(event);
            if done {
                return events;
            }
        }
    }
}

pub fn kinds(events: &[RecorderEvent]) -> Vec<EventKind> {
    events.iter().map(RecorderEvent::kind).collect()
}

pub fn count(events: &[RecorderEvent], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind() == kind).count()
}

/// A recorder wired to a [`MockLauncher`] in a temporary destination.
pub struct TestHarness {
    pub dir: TempDir,
    pub launcher: Arc<MockLauncher>,
    pub recorder: Recorder,
    pub events: EventStream,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_options(RecorderOptions::default().with_playlist_name("cam"))
    }

    pub fn with_options(options: RecorderOptions) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        Self::in_dir(dir, options)
    }

    pub fn in_dir(dir: TempDir, options: RecorderOptions) -> Self {
        let launcher = Arc::new(MockLauncher::new());
        let recorder = Recorder::with_launcher(
            fixtures::TEST_URI,
            dir.path(),
            options,
            Arc::clone(&launcher) as Arc<dyn recorder_core::TranscoderLauncher>,
        )
        .expect("Failed to create recorder");
        let events = EventStream {
            rx: recorder.subscribe(),
        };

        Self {
            dir,
            launcher,
            recorder,
            events,
        }
    }

    pub async fn process(&self) -> MockProcess {
        self.launcher
            .last_process()
            .await
            .expect("No process spawned")
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }
}

/// Creates a sparse file of `len` bytes, with parent directories.
pub fn sparse_file(path: &Path, len: u64) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    let file = std::fs::File::create(path).expect("Failed to create file");
    file.set_len(len).expect("Failed to size file");
}

pub fn touch(path: &Path) {
    sparse_file(path, 4);
}
