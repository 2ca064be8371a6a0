//! Event dispatch: ordered per-kind listeners plus a broadcast stream.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::trace;

use super::events::{EventKind, RecorderEvent};

/// Capacity of the broadcast stream. Slow subscribers skip events.
pub const EVENT_BROADCAST_CAPACITY: usize = 256;

/// Identifies a registered listener for [`EventBus::remove_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Arc<dyn Fn(&RecorderEvent) + Send + Sync>;

/// Delivers events to listeners and broadcast subscribers.
///
/// Listeners for a kind run in subscription order. Delivery is serialized,
/// so a listener never runs concurrently with another delivery. Listeners
/// may add or remove listeners but must not emit from inside their callback.
pub struct EventBus {
    listeners: Mutex<HashMap<EventKind, Vec<(ListenerId, Listener)>>>,
    dispatch: Mutex<()>,
    next_id: AtomicU64,
    tx: broadcast::Sender<RecorderEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BROADCAST_CAPACITY);
        Self {
            listeners: Mutex::new(HashMap::new()),
            dispatch: Mutex::new(()),
            next_id: AtomicU64::new(1),
            tx,
        }
    }

    /// Registers `listener` for events of `kind`.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&RecorderEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(kind)
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns whether it was registered.
    pub fn remove_listener(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        match listeners.get_mut(&kind) {
            Some(list) => {
                let before = list.len();
                list.retain(|(listener_id, _)| *listener_id != id);
                list.len() != before
            }
            None => false,
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Stream of every event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<RecorderEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: RecorderEvent) {
        let kind = event.kind();
        trace!("Emitting {:?}", kind);

        let _guard = self.dispatch.lock().unwrap_or_else(|e| e.into_inner());

        // Snapshot so listeners added or removed during delivery take effect
        // from the next event.
        let snapshot: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .map(|list| list.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();

        for listener in snapshot {
            listener(&event);
        }

        // No subscribers is fine.
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.tx.receiver_count())
            .finish_non_exhaustive()
    }
}
