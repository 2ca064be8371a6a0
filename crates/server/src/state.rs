use recorder_core::{Config, Recorder, SanitizedConfig};

use crate::api::WsBroadcaster;

/// Shared application state
pub struct AppState {
    config: Config,
    recorder: Recorder,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    pub fn new(config: Config, recorder: Recorder, ws_broadcaster: WsBroadcaster) -> Self {
        Self {
            config,
            recorder,
            ws_broadcaster,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }
}
