//! ffmpeg argument vector for segmented HLS recording.

use super::types::LaunchSpec;
use crate::recorder::RecorderConfig;

/// Builds the argument vector for `config`. Order matters to ffmpeg and is
/// kept stable.
pub fn build_hls_args(config: &RecorderConfig) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-rtsp_transport".into(),
        "tcp".into(),
        "-i".into(),
        config.uri.clone(),
        "-reset_timestamps".into(),
        "1".into(),
    ];

    if let Some(title) = &config.title {
        args.push("-metadata".into());
        args.push(format!("title=\"{}\"", title));
    }

    if config.no_audio {
        args.push("-an".into());
    } else {
        args.push("-c:a".into());
        args.push("aac".into());
    }

    args.extend([
        "-strftime".into(),
        "1".into(),
        "-strftime_mkdir".into(),
        "1".into(),
        "-hls_time".into(),
        config.segment_time.to_string(),
        "-hls_list_size".into(),
        "0".into(),
        "-hls_segment_filename".into(),
        format!("{}.mp4", config.file_pattern),
        format!("./{}", config.playlist_file_name()),
    ]);

    args
}

/// Full launch description: binary, arguments, destination as working dir.
pub fn launch_spec(config: &RecorderConfig) -> LaunchSpec {
    LaunchSpec {
        program: config.ffmpeg_binary.clone(),
        args: build_hls_args(config),
        cwd: config.destination.clone(),
    }
}
