use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recorder_core::{
    load_config, validate_config, FfmpegLauncher, Recorder, RecorderEvent, TranscoderLauncher,
    CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH,
};
use recorder_server::api::{create_router, ws::HEARTBEAT_INTERVAL, WsBroadcaster};
use recorder_server::state::AppState;

/// Upper bound on waiting for the last segments to be finalized at exit.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Destination: {:?}", config.recorder.destination);

    let launcher = Arc::new(FfmpegLauncher::new());
    let recorder = Recorder::with_launcher(
        config.recorder.uri.clone(),
        &config.recorder.destination,
        config.recorder.options.clone(),
        Arc::clone(&launcher) as Arc<dyn TranscoderLauncher>,
    )
    .context("Failed to create recorder")?;

    // A missing binary is reported again on every start, so keep serving
    match launcher.validate(&recorder.config().ffmpeg_binary).await {
        Ok(()) => info!("Using {:?}", recorder.config().ffmpeg_binary),
        Err(e) => warn!("Transcoder check failed: {}", e),
    }

    tokio::spawn(log_events(recorder.subscribe()));

    // Create WebSocket broadcaster for live events
    let ws_broadcaster = WsBroadcaster::default();
    let relay_handle = ws_broadcaster.forward(&recorder, HEARTBEAT_INTERVAL);
    info!("WebSocket broadcaster initialized");

    if config.recorder.autostart {
        info!("Autostart enabled, starting recording");
        recorder.start().await;
    }

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        recorder.clone(),
        ws_broadcaster,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");

    // Stop an active recording and let pending segments finalize
    if recorder.is_recording() {
        info!("Stopping recording...");
        recorder.stop().await;
    }
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, recorder.wait_until_idle())
        .await
        .is_err()
    {
        warn!("Recorder did not stop within {:?}", SHUTDOWN_TIMEOUT);
    } else {
        info!("Recorder stopped");
    }

    relay_handle.abort();

    Ok(())
}

/// Mirrors recorder events into the service log.
async fn log_events(mut events: broadcast::Receiver<RecorderEvent>) {
    loop {
        match events.recv().await {
            Ok(RecorderEvent::Error { error }) => warn!(kind = error.kind(), "{}", error),
            Ok(RecorderEvent::Progress { message }) => debug!("{}", message),
            Ok(RecorderEvent::SpaceFull(usage)) => warn!(
                used = usage.used,
                threshold = usage.threshold,
                "Destination is full"
            ),
            Ok(RecorderEvent::Stopped { code, reason }) => {
                info!(?code, %reason, "Recording stopped")
            }
            Ok(RecorderEvent::Started(started)) => {
                info!("Output started, playlist {}", started.playlist)
            }
            Ok(event) => info!(kind = ?event.kind(), "{:?}", event),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Event log lagged, skipped {} events", n)
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
