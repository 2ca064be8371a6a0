//! WebSocket stream of recorder events.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use recorder_core::config::redact_uri_credentials;
use recorder_core::{Recorder, RecorderEvent, RecorderStatus};

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS, WS_MESSAGES_SENT};
use crate::state::AppState;

/// Interval between heartbeats sent to every client.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// WebSocket message sent to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// An event emitted by the recorder, in emission order.
    Event { event: RecorderEvent },
    /// The recorder changed status.
    Status { status: RecorderStatus },
    /// Server heartbeat (sent periodically to keep connection alive).
    Heartbeat { timestamp: i64 },
}

impl WsMessage {
    fn type_label(&self) -> &'static str {
        match self {
            WsMessage::Event { .. } => "event",
            WsMessage::Status { .. } => "status",
            WsMessage::Heartbeat { .. } => "heartbeat",
        }
    }
}

/// Broadcaster for WebSocket messages using tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsMessage>,
}

impl WsBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast a message to all connected clients.
    pub fn broadcast(&self, msg: WsMessage) {
        // Ignore send errors - they just mean no one is listening
        let _ = self.sender.send(msg);
    }

    /// Subscribe to receive messages.
    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.sender.subscribe()
    }

    /// Relays a recorder's events and status changes, plus periodic
    /// heartbeats, until the recorder's event stream closes.
    pub fn forward(&self, recorder: &Recorder, heartbeat: Duration) -> JoinHandle<()> {
        let broadcaster = self.clone();
        let mut events = recorder.subscribe();
        let mut status = recorder.watch_status();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(heartbeat);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    result = events.recv() => match result {
                        Ok(event) => broadcaster.broadcast(WsMessage::Event {
                            event: redact_event(event),
                        }),
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("Event relay lagged, skipped {} recorder events", n);
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("Recorder event stream closed");
                            break;
                        }
                    },
                    changed = status.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let current = *status.borrow_and_update();
                        broadcaster.broadcast(WsMessage::Status { status: current });
                    }
                    _ = ticker.tick() => {
                        broadcaster.broadcast(WsMessage::Heartbeat {
                            timestamp: chrono::Utc::now().timestamp(),
                        });
                    }
                }
            }
        })
    }
}

/// Hides stream credentials from events that leave the process.
fn redact_event(event: RecorderEvent) -> RecorderEvent {
    match event {
        RecorderEvent::Started(mut info) => {
            info.config.uri = redact_uri_credentials(&info.config.uri);
            RecorderEvent::Started(info)
        }
        event => event,
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before sending the snapshot so no transition is missed
    let mut rx = state.ws_broadcaster().subscribe();
    let snapshot = WsMessage::Status {
        status: state.recorder().status(),
    };

    // Track connection metrics
    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();

    info!("WebSocket client connected");

    // Spawn task to forward broadcast messages to this client
    let send_task = tokio::spawn(async move {
        if send_message(&mut sender, &snapshot).await.is_err() {
            return;
        }

        loop {
            match rx.recv().await {
                Ok(msg) => {
                    if send_message(&mut sender, &msg).await.is_err() {
                        debug!("WebSocket send failed, client disconnected");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("WebSocket client lagged, skipped {} messages", n);
                    WS_LAG_EVENTS.inc();
                    // Continue receiving - the client will catch up
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Broadcast channel closed");
                    break;
                }
            }
        }
    });

    // Handle incoming messages from client (ping/pong, close)
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Ping(data)) => {
                // Pong is handled automatically by axum
                debug!("Received ping: {:?}", data);
            }
            Ok(Message::Text(text)) => {
                // We don't expect any client messages, but log them
                debug!("Received text message: {}", text);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    // Clean up
    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected");
}

/// Serializes and sends one message. `Err` means the client is gone.
async fn send_message<S>(sender: &mut S, msg: &WsMessage) -> Result<(), ()>
where
    S: SinkExt<Message> + Unpin,
{
    WS_MESSAGES_SENT.with_label_values(&[msg.type_label()]).inc();

    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.map_err(|_| ()),
        Err(e) => {
            error!("Failed to serialize WsMessage: {}", e);
            Ok(())
        }
    }
}
