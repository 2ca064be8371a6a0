pub mod config;
pub mod metrics;
pub mod options;
pub mod parser;
pub mod quota;
pub mod recorder;
pub mod testing;
pub mod transcoder;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, RecordingConfig,
    SanitizedConfig, ServerConfig, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH,
};
pub use options::{DirSizeThreshold, RecorderOptions, SegmentTime};
pub use quota::SpaceUsage;
pub use recorder::{
    EventKind, ListenerId, Recorder, RecorderConfig, RecorderError, RecorderEvent, RecorderStatus,
    RecorderValidationError, StartedInfo, StopReason,
};
pub use transcoder::{FfmpegLauncher, TranscoderError, TranscoderLauncher};
