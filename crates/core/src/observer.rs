// crates/core/src/observer.rs
//! Push-notification boundary for run progress and log events.
//!
//! The engine only knows a `notify` capability; any transport (WebSocket,
//! server-sent events, polling) can sit behind it.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::logbook::LogEntry;
use crate::run_state::RunState;
use crate::table::TableId;

/// Event pushed on every run state change and every log entry.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RunEvent {
    #[serde(rename_all = "camelCase")]
    State { table_id: TableId, state: RunState },
    #[serde(rename_all = "camelCase")]
    Log { table_id: TableId, entry: LogEntry },
}

pub trait Observer: Send + Sync {
    fn notify(&self, event: RunEvent);
}

/// Fans events out over a tokio broadcast channel.
pub struct BroadcastObserver {
    tx: broadcast::Sender<RunEvent>,
}

impl BroadcastObserver {
    pub fn new(tx: broadcast::Sender<RunEvent>) -> Self {
        Self { tx }
    }

    /// Create an observer with its own channel of the given capacity.
    pub fn channel(capacity: usize) -> (Self, broadcast::Receiver<RunEvent>) {
        let (tx, rx) = broadcast::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.tx.subscribe()
    }
}

impl Observer for BroadcastObserver {
    fn notify(&self, event: RunEvent) {
        // Ignore send errors (no subscribers is fine).
        let _ = self.tx.send(event);
    }
}

/// Observer that discards every event.
pub struct NullObserver;

impl Observer for NullObserver {
    fn notify(&self, _event: RunEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_event_serialization() {
        let event = RunEvent::State {
            table_id: 3,
            state: RunState::processing(1, 2),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "state");
        assert_eq!(json["tableId"], 3);
        assert_eq!(json["state"]["status"], "processing");
    }

    #[test]
    fn test_log_event_serialization() {
        let event = RunEvent::Log {
            table_id: 9,
            entry: crate::logbook::LogEntry::new(crate::logbook::LogLevel::Info, "hi"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "log");
        assert_eq!(json["tableId"], 9);
        assert_eq!(json["entry"]["text"], "hi");
    }

    #[tokio::test]
    async fn test_broadcast_observer_delivers() {
        let (observer, mut rx) = BroadcastObserver::channel(8);
        observer.notify(RunEvent::State {
            table_id: 1,
            state: RunState::idle(),
        });
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, RunEvent::State { table_id: 1, .. }));
    }

    #[test]
    fn test_broadcast_observer_no_subscribers() {
        let (tx, rx) = broadcast::channel(1);
        drop(rx);
        let observer = BroadcastObserver::new(tx);
        // Must not panic with zero subscribers.
        observer.notify(RunEvent::State {
            table_id: 1,
            state: RunState::idle(),
        });
    }
}
