//! Testing utilities and mock implementations.
//!
//! [`MockLauncher`] stands in for ffmpeg, so sessions can be driven through
//! their whole lifecycle without a real process or stream.
//!
//! # Example
//!
//! ```rust,ignore
//! use recorder_core::testing::{fixtures, MockLauncher};
//!
//! let launcher = Arc::new(MockLauncher::new());
//! let recorder = Recorder::with_launcher(
//!     fixtures::TEST_URI,
//!     dir.path(),
//!     RecorderOptions::default(),
//!     launcher.clone(),
//! )?;
//! recorder.start().await;
//! launcher.last_process().await.unwrap().emit_line(fixtures::opening("a.mp4")).await;
//! ```

mod mock_launcher;

pub use mock_launcher::{MockLauncher, MockProcess, MOCK_KILL_EXIT_CODE};

/// ffmpeg output fixtures.
pub mod fixtures {
    /// Source URI used throughout tests.
    pub const TEST_URI: &str = "rtsp://localhost:554/stream";

    /// `Opening ... for writing` line as the HLS muxer prints it.
    pub fn opening(path: &str) -> String {
        format!("[hls @ 0x7f8a1c0] Opening '{}' for writing", path)
    }

    /// Segment open failure line.
    pub fn failed(path: &str) -> String {
        format!("[hls @ 0x7f8a1c0] Failed to open segment '{}'", path)
    }

    /// Output announcement for a playlist name without extension.
    pub fn output_started(playlist_name: &str) -> String {
        format!("Output #0, hls, to './{}.m3u8':", playlist_name)
    }

    /// A progress line that matches nothing.
    pub fn progress() -> String {
        "frame=  250 fps= 25 q=-1.0 size=N/A time=00:00:10.00 bitrate=N/A speed=1.00x"
            .to_string()
    }
}
