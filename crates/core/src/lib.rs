// crates/core/src/lib.rs
//! rowforge core: the row-processing engine and its collaborators.
//!
//! The engine turns {table, templates, control signal} into a resilient,
//! interruptible, progress-reporting enrichment run with per-cell failure
//! isolation. Serving concerns live in `rowforge-server`.

pub mod autocomplete;
pub mod engine;
pub mod error;
pub mod export;
pub mod generation;
pub mod logbook;
pub mod observer;
pub mod run_state;
pub mod store;
pub mod table;
pub mod template;

pub use engine::{Engine, RunEnd, RunOutcome, API_ERROR, NO_RESPONSE};
pub use error::{
    ControlError, ExportError, ParseError, RunError, StoreError, TransitionError, ValidationError,
};
pub use logbook::{LogEntry, LogLevel};
pub use observer::{BroadcastObserver, NullObserver, Observer, RunEvent};
pub use run_state::{ControlRequest, RunState, RunStatus};
pub use store::{InMemoryStore, TableStore};
pub use table::{EnrichedRow, Row, Table, TableId, TableMeta};
pub use template::TemplateConfig;
