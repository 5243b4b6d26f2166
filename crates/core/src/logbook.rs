// crates/core/src/logbook.rs
//! Append-only per-table run log.
//!
//! Run-scoped, user-visible events land here (and fan out through the
//! observer); `tracing` remains the operator channel. Both fire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::observer::{Observer, RunEvent};
use crate::store::TableStore;
use crate::table::TableId;

/// Severity/category of a run log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One entry in a table's run log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: Uuid,
    pub level: LogLevel,
    pub text: String,
    pub occurred_at: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(level: LogLevel, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            text: text.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// Truncate text for log display. Appends "..." when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

/// Writes run log entries to the store and notifies the observer.
///
/// Scoped to one table for the duration of one run invocation.
pub struct RunLogger<'a> {
    pub store: &'a dyn TableStore,
    pub observer: &'a dyn Observer,
    pub table_id: TableId,
}

impl RunLogger<'_> {
    pub fn log(&self, level: LogLevel, text: impl Into<String>) {
        let entry = LogEntry::new(level, text);
        if let Err(e) = self.store.append_log(self.table_id, entry.clone()) {
            tracing::warn!(table_id = self.table_id, error = %e, "failed to append run log entry");
        }
        self.observer.notify(RunEvent::Log {
            table_id: self.table_id,
            entry,
        });
    }
}
