use super::{types::Config, ConfigError};
use crate::options::verify_all_options;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Recorder URI is not empty
/// - Recorder options pass the same checks as `Recorder::new`
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.recorder.uri.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "recorder.uri cannot be empty".to_string(),
        ));
    }

    let errors = verify_all_options(&config.recorder.destination, &config.recorder.options);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationError(errors.join("; ")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RecordingConfig, ServerConfig};
    use crate::options::RecorderOptions;
    use std::net::IpAddr;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> Config {
        Config {
            server: ServerConfig::default(),
            recorder: RecordingConfig {
                uri: "rtsp://cam/stream".to_string(),
                destination: dir.path().to_path_buf(),
                autostart: false,
                options: RecorderOptions::default(),
            },
        }
    }

    #[test]
    fn test_validate_valid_config() {
        let dir = TempDir::new().unwrap();
        assert!(validate_config(&config(&dir)).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.server = ServerConfig {
            host: "0.0.0.0".parse::<IpAddr>().unwrap(),
            port: 0,
        };
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_empty_uri_fails() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.recorder.uri = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_reports_every_option_error() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.recorder.destination = dir.path().join("missing");
        config.recorder.options = RecorderOptions::default()
            .with_segment_time(1)
            .with_dir_size_threshold(1);

        let err = validate_config(&config).unwrap_err();
        let ConfigError::ValidationError(message) = err else {
            panic!("expected a validation error");
        };
        assert_eq!(message.split("; ").count(), 3);
    }
}
