// crates/core/src/store.rs
//! Table storage boundary.
//!
//! The engine and the serving layer talk to a `TableStore` trait so the
//! backing can be swapped (in-memory here; anything keyed by table id works).
//! State is process-local and lost on restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::StoreError;
use crate::logbook::LogEntry;
use crate::run_state::RunState;
use crate::table::{Table, TableId, TableMeta};
use crate::template::TemplateConfig;

pub trait TableStore: Send + Sync {
    /// Store a table, assign it an id, and create its idle run state.
    fn insert_table(&self, table: Table) -> TableId;

    fn get_table(&self, id: TableId) -> Result<TableMeta, StoreError>;
    fn get_table_data(&self, id: TableId) -> Result<Table, StoreError>;

    /// Replace the table's template configurations wholesale.
    fn set_template_configs(
        &self,
        id: TableId,
        configs: Vec<TemplateConfig>,
    ) -> Result<(), StoreError>;
    fn get_template_configs(&self, id: TableId) -> Result<Vec<TemplateConfig>, StoreError>;
    /// Delete one configuration by id. Unknown config ids are a no-op.
    fn delete_template_config(&self, id: TableId, config_id: &str) -> Result<(), StoreError>;

    fn get_run_state(&self, id: TableId) -> Result<RunState, StoreError>;
    fn set_run_state(&self, id: TableId, state: RunState) -> Result<(), StoreError>;
    /// Read-modify-write the run state under the store's write lock, so a
    /// control request and the engine's progress write can never interleave.
    /// Returns the state after the closure ran.
    fn update_run_state(
        &self,
        id: TableId,
        f: &mut dyn FnMut(&mut RunState),
    ) -> Result<RunState, StoreError>;

    fn append_log(&self, id: TableId, entry: LogEntry) -> Result<(), StoreError>;
    fn get_logs(&self, id: TableId) -> Result<Vec<LogEntry>, StoreError>;
    fn clear_logs(&self, id: TableId) -> Result<(), StoreError>;
}

struct TableRecord {
    table: Table,
    configs: Vec<TemplateConfig>,
    run_state: RunState,
    logs: Vec<LogEntry>,
}

/// In-memory `TableStore` keyed by numeric table id.
pub struct InMemoryStore {
    next_id: AtomicU64,
    tables: RwLock<HashMap<TableId, TableRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            tables: RwLock::new(HashMap::new()),
        }
    }

    // A poisoned lock only means a writer panicked; the map itself is intact.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<TableId, TableRecord>> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TableId, TableRecord>> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TableStore for InMemoryStore {
    fn insert_table(&self, table: Table) -> TableId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.write().insert(
            id,
            TableRecord {
                table,
                configs: Vec::new(),
                run_state: RunState::idle(),
                logs: Vec::new(),
            },
        );
        id
    }

    fn get_table(&self, id: TableId) -> Result<TableMeta, StoreError> {
        self.read()
            .get(&id)
            .map(|r| r.table.meta())
            .ok_or(StoreError::TableNotFound(id))
    }

    fn get_table_data(&self, id: TableId) -> Result<Table, StoreError> {
        self.read()
            .get(&id)
            .map(|r| r.table.clone())
            .ok_or(StoreError::TableNotFound(id))
    }

    fn set_template_configs(
        &self,
        id: TableId,
        configs: Vec<TemplateConfig>,
    ) -> Result<(), StoreError> {
        let mut tables = self.write();
        let record = tables.get_mut(&id).ok_or(StoreError::TableNotFound(id))?;
        record.configs = configs;
        Ok(())
    }

    fn get_template_configs(&self, id: TableId) -> Result<Vec<TemplateConfig>, StoreError> {
        self.read()
            .get(&id)
            .map(|r| r.configs.clone())
            .ok_or(StoreError::TableNotFound(id))
    }

    fn delete_template_config(&self, id: TableId, config_id: &str) -> Result<(), StoreError> {
        let mut tables = self.write();
        let record = tables.get_mut(&id).ok_or(StoreError::TableNotFound(id))?;
        record.configs.retain(|c| c.id != config_id);
        Ok(())
    }

    fn get_run_state(&self, id: TableId) -> Result<RunState, StoreError> {
        self.read()
            .get(&id)
            .map(|r| r.run_state.clone())
            .ok_or(StoreError::TableNotFound(id))
    }

    fn set_run_state(&self, id: TableId, state: RunState) -> Result<(), StoreError> {
        let mut tables = self.write();
        let record = tables.get_mut(&id).ok_or(StoreError::TableNotFound(id))?;
        record.run_state = state;
        Ok(())
    }

    fn update_run_state(
        &self,
        id: TableId,
        f: &mut dyn FnMut(&mut RunState),
    ) -> Result<RunState, StoreError> {
        let mut tables = self.write();
        let record = tables.get_mut(&id).ok_or(StoreError::TableNotFound(id))?;
        f(&mut record.run_state);
        Ok(record.run_state.clone())
    }

    fn append_log(&self, id: TableId, entry: LogEntry) -> Result<(), StoreError> {
        let mut tables = self.write();
        let record = tables.get_mut(&id).ok_or(StoreError::TableNotFound(id))?;
        record.logs.push(entry);
        Ok(())
    }

    fn get_logs(&self, id: TableId) -> Result<Vec<LogEntry>, StoreError> {
        self.read()
            .get(&id)
            .map(|r| r.logs.clone())
            .ok_or(StoreError::TableNotFound(id))
    }

    fn clear_logs(&self, id: TableId) -> Result<(), StoreError> {
        let mut tables = self.write();
        let record = tables.get_mut(&id).ok_or(StoreError::TableNotFound(id))?;
        record.logs.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logbook::LogLevel;
    use crate::run_state::RunStatus;
    use pretty_assertions::assert_eq;

    fn sample_table() -> Table {
        Table::new(vec!["name".into(), "age".into()], vec![]).unwrap()
    }

    #[test]
    fn test_insert_and_get_table() {
        let store = InMemoryStore::new();
        let id = store.insert_table(sample_table());

        let meta = store.get_table(id).unwrap();
        assert_eq!(meta.field_names, vec!["name", "age"]);
        assert_eq!(meta.row_count, 0);

        // A fresh table starts idle.
        let state = store.get_run_state(id).unwrap();
        assert_eq!(state.status, RunStatus::Idle);
    }

    #[test]
    fn test_missing_table_is_not_found() {
        let store = InMemoryStore::new();
        assert_eq!(store.get_table(42), Err(StoreError::TableNotFound(42)));
        assert_eq!(
            store.get_run_state(42),
            Err(StoreError::TableNotFound(42))
        );
    }

    #[test]
    fn test_template_configs_replace_wholesale() {
        let store = InMemoryStore::new();
        let id = store.insert_table(sample_table());

        let first = vec![TemplateConfig {
            id: "a".into(),
            template_text: "Hello {{name}}".into(),
            output_field_name: "greeting".into(),
        }];
        store.set_template_configs(id, first).unwrap();
        assert_eq!(store.get_template_configs(id).unwrap().len(), 1);

        let second = vec![
            TemplateConfig {
                id: "b".into(),
                template_text: "Age of {{name}}?".into(),
                output_field_name: "age_guess".into(),
            },
            TemplateConfig {
                id: "c".into(),
                template_text: "Bio for {{name}}".into(),
                output_field_name: "bio".into(),
            },
        ];
        store.set_template_configs(id, second).unwrap();
        let configs = store.get_template_configs(id).unwrap();
        // Prior set is gone
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].id, "b");
    }

    #[test]
    fn test_delete_template_config_by_id() {
        let store = InMemoryStore::new();
        let id = store.insert_table(sample_table());
        store
            .set_template_configs(
                id,
                vec![
                    TemplateConfig {
                        id: "a".into(),
                        template_text: "t1".into(),
                        output_field_name: "o1".into(),
                    },
                    TemplateConfig {
                        id: "b".into(),
                        template_text: "t2".into(),
                        output_field_name: "o2".into(),
                    },
                ],
            )
            .unwrap();

        store.delete_template_config(id, "a").unwrap();
        let configs = store.get_template_configs(id).unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].id, "b");

        // Unknown id is a no-op
        store.delete_template_config(id, "nope").unwrap();
        assert_eq!(store.get_template_configs(id).unwrap().len(), 1);
    }

    #[test]
    fn test_update_run_state_returns_snapshot() {
        let store = InMemoryStore::new();
        let id = store.insert_table(sample_table());
        let snapshot = store
            .update_run_state(id, &mut |s| {
                s.processed_rows = 3;
                s.total_rows = 10;
                s.progress_percent = RunState::percent(3, 10);
            })
            .unwrap();
        assert_eq!(snapshot.processed_rows, 3);
        assert_eq!(snapshot.progress_percent, 30);
        assert_eq!(store.get_run_state(id).unwrap(), snapshot);
    }

    #[test]
    fn test_logs_append_and_clear() {
        let store = InMemoryStore::new();
        let id = store.insert_table(sample_table());
        store
            .append_log(id, LogEntry::new(LogLevel::Info, "one"))
            .unwrap();
        store
            .append_log(id, LogEntry::new(LogLevel::Error, "two"))
            .unwrap();

        let logs = store.get_logs(id).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].text, "one");
        assert_eq!(logs[1].text, "two");

        // Clearing logs does not touch run state.
        store
            .set_run_state(id, RunState::processing(1, 2))
            .unwrap();
        store.clear_logs(id).unwrap();
        assert!(store.get_logs(id).unwrap().is_empty());
        assert_eq!(
            store.get_run_state(id).unwrap().status,
            RunStatus::Processing
        );
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let store = InMemoryStore::new();
        let a = store.insert_table(sample_table());
        let b = store.insert_table(sample_table());
        assert!(b > a);
    }
}
