//! Transcoder process supervision.
//!
//! Spawns ffmpeg with the segmented-recording argument vector and relays
//! its diagnostic output, runtime errors and exit status as
//! [`ProcessEvent`]s. Nothing here interprets the output; see
//! [`crate::parser`].

mod args;
mod error;
mod ffmpeg;
mod lines;
mod traits;
mod types;

pub use args::{build_hls_args, launch_spec};
pub use error::TranscoderError;
pub use ffmpeg::{FfmpegLauncher, PROCESS_EVENT_BUFFER};
pub use lines::LineSplitter;
pub use traits::{TranscoderHandle, TranscoderLauncher};
pub use types::{LaunchSpec, ProcessEvent};
