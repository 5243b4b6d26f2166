// crates/server/src/state.rs
//! Application state for the Axum server.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use tokio::sync::broadcast;

use rowforge_core::engine::RunOutcome;
use rowforge_core::generation::GenerationProvider;
use rowforge_core::{BroadcastObserver, Engine, EnrichedRow, InMemoryStore, RunEvent, TableId};

/// Per-table bookkeeping for the current/most recent run.
///
/// Accumulates enriched rows across pause/resume cycles so export can merge
/// partial results, and tracks the next unprocessed row for resume.
#[derive(Debug, Default)]
pub struct RunSession {
    pub rows: Vec<EnrichedRow>,
    pub next_row: usize,
    /// True while a spawned run task is in flight for this table.
    pub active: bool,
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// In-memory table store shared with the engine.
    pub store: Arc<InMemoryStore>,
    /// The row-processing engine.
    pub engine: Arc<Engine>,
    /// Broadcast sender for run events (WebSocket fan-out).
    pub events_tx: broadcast::Sender<RunEvent>,
    /// Run sessions keyed by table id.
    /// `std::sync::RwLock`: held briefly, never across an `.await`.
    sessions: RwLock<HashMap<TableId, RunSession>>,
}

impl AppState {
    /// Create application state around a generation provider.
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Arc<Self> {
        let store = Arc::new(InMemoryStore::new());
        let (events_tx, _) = broadcast::channel(256);
        let observer = Arc::new(BroadcastObserver::new(events_tx.clone()));
        let engine = Arc::new(Engine::new(store.clone(), provider, observer));
        Arc::new(Self {
            start_time: Instant::now(),
            store,
            engine,
            events_tx,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Run the closure with the table's session under the write lock.
    pub fn with_session<T>(&self, table_id: TableId, f: impl FnOnce(&mut RunSession) -> T) -> T {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(sessions.entry(table_id).or_default())
    }

    /// Snapshot the enriched rows accumulated for a table (empty if no run
    /// has produced anything yet).
    pub fn session_rows(&self, table_id: TableId) -> Vec<EnrichedRow> {
        let sessions = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        sessions
            .get(&table_id)
            .map(|s| s.rows.clone())
            .unwrap_or_default()
    }

    /// Fold a finished run invocation into the table's session.
    pub fn record_outcome(&self, table_id: TableId, outcome: RunOutcome) {
        self.with_session(table_id, |session| {
            session.rows.extend(outcome.rows);
            session.next_row = outcome.next_row;
            session.active = false;
        });
    }

    /// Mark the run task finished without new rows (error path).
    pub fn mark_inactive(&self, table_id: TableId) {
        self.with_session(table_id, |session| session.active = false);
    }
}
