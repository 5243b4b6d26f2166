// crates/core/src/engine.rs
//! Row-processing engine: drives one enrichment run over a table.
//!
//! The engine iterates rows in table order, filling every template for a row
//! and calling the generation provider once per (row, template) cell. Run
//! state is polled at each row boundary — pause/stop requested externally
//! takes effect at the next boundary; rate limiting and credential rejection
//! interrupt mid-row.

use std::sync::Arc;

use crate::error::{ControlError, RunError, StoreError, ValidationError};
use crate::generation::{CellContext, CellOutcome, GenerationClient, GenerationProvider};
use crate::logbook::{LogLevel, RunLogger};
use crate::observer::{Observer, RunEvent};
use crate::run_state::{ControlRequest, RunState, RunStatus};
use crate::store::TableStore;
use crate::table::{EnrichedRow, Table, TableId};
use crate::template::{self, TemplateConfig};

/// Sentinel recorded when a cell's generation produced no usable response.
pub const NO_RESPONSE: &str = "NO_RESPONSE";

/// Sentinel recorded when a cell's generation failed with an API error.
pub const API_ERROR: &str = "API_ERROR";

/// How a run invocation ended when it returned normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// Every row was processed.
    Completed,
    /// Paused externally or by rate limiting; resumable from `next_row`.
    Paused,
    /// Stopped externally.
    Stopped,
}

/// Result of one `run` invocation.
#[derive(Debug)]
pub struct RunOutcome {
    /// Rows enriched by this invocation, in table order.
    pub rows: Vec<EnrichedRow>,
    /// Index of the first row not yet processed (== row count on completion).
    pub next_row: usize,
    pub end: RunEnd,
}

pub struct Engine {
    store: Arc<dyn TableStore>,
    provider: Arc<dyn GenerationProvider>,
    observer: Arc<dyn Observer>,
}

impl Engine {
    pub fn new(
        store: Arc<dyn TableStore>,
        provider: Arc<dyn GenerationProvider>,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            store,
            provider,
            observer,
        }
    }

    /// Apply an external control request (start/pause/resume/stop).
    ///
    /// The transition is validated and applied under the store's write lock,
    /// so a request can never interleave with the engine's own state writes.
    /// Returns the run state after the transition.
    pub fn control(
        &self,
        table_id: TableId,
        request: ControlRequest,
    ) -> Result<RunState, ControlError> {
        let mut outcome = Ok(());
        let state = self.store.update_run_state(table_id, &mut |s| {
            match s.status.apply(request) {
                Ok(next) => {
                    s.status = next;
                    if request == ControlRequest::Start {
                        s.processed_rows = 0;
                        s.progress_percent = 0;
                        s.error_detail = None;
                    }
                }
                Err(e) => outcome = Err(e),
            }
        })?;
        outcome?;

        tracing::info!(table_id, request = %request, status = %state.status, "run control applied");
        self.observer.notify(RunEvent::State {
            table_id,
            state: state.clone(),
        });
        Ok(state)
    }

    /// Run enrichment over the table's rows starting at `start_row`.
    ///
    /// Returns normally on completion, pause, or stop with the rows enriched
    /// by this invocation. Credential rejection and unclassified failures
    /// return `Err` after run state and the run log are updated, so
    /// observers always see the terminal state before the error propagates.
    pub async fn run(
        &self,
        table_id: TableId,
        start_row: usize,
    ) -> Result<RunOutcome, RunError> {
        // Preconditions surface synchronously and never touch run state.
        let table = self.store.get_table_data(table_id)?;
        let configs = self.store.get_template_configs(table_id)?;
        if configs.is_empty() {
            return Err(ValidationError::NoConfigs.into());
        }

        match self.run_rows(table_id, &table, &configs, start_row).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                // Auth failures already wrote their terminal state; anything
                // else unclassified becomes a fatal error state here.
                if !matches!(err, RunError::Auth(_)) {
                    let detail = err.to_string();
                    let state = self.store.update_run_state(table_id, &mut |s| {
                        s.status = RunStatus::Error;
                        s.error_detail = Some(detail.clone());
                    });
                    if let Ok(state) = state {
                        self.observer.notify(RunEvent::State { table_id, state });
                    }
                    self.logger(table_id)
                        .log(LogLevel::Error, format!("Enrichment run failed: {detail}"));
                }
                Err(err)
            }
        }
    }

    async fn run_rows(
        &self,
        table_id: TableId,
        table: &Table,
        configs: &[TemplateConfig],
        start_row: usize,
    ) -> Result<RunOutcome, RunError> {
        let total = table.rows.len();
        let logger = self.logger(table_id);
        let client = GenerationClient {
            provider: &*self.provider,
            logger: &logger,
        };

        self.set_state(table_id, RunState::processing(start_row, total))?;
        tracing::info!(
            table_id,
            start_row,
            total_rows = total,
            templates = configs.len(),
            provider = self.provider.name(),
            "enrichment run started"
        );

        let mut enriched: Vec<EnrichedRow> = Vec::new();
        let mut no_response_cells = 0usize;
        let mut api_error_cells = 0usize;

        for (index, row) in table.rows.iter().enumerate().skip(start_row) {
            // Control requests land between rows; an in-flight row always
            // finishes before pause/stop takes effect.
            let state = self.store.get_run_state(table_id)?;
            match state.status {
                RunStatus::Paused => {
                    logger.log(
                        LogLevel::Info,
                        format!("Run paused after {index} of {total} rows"),
                    );
                    return Ok(RunOutcome {
                        rows: enriched,
                        next_row: index,
                        end: RunEnd::Paused,
                    });
                }
                RunStatus::Idle | RunStatus::Error => {
                    logger.log(
                        LogLevel::Info,
                        format!("Run stopped after {index} of {total} rows"),
                    );
                    return Ok(RunOutcome {
                        rows: enriched,
                        next_row: index,
                        end: RunEnd::Stopped,
                    });
                }
                RunStatus::Processing | RunStatus::Completed => {}
            }

            let mut out_row: EnrichedRow = row.clone();
            for config in configs {
                let prompt = template::fill(&config.template_text, row);
                let ctx = CellContext {
                    row_index: index,
                    output_field: config.output_field_name.clone(),
                };
                match client.generate(&prompt, &ctx).await {
                    CellOutcome::Text(text) => {
                        out_row.insert(config.output_field_name.clone(), Some(text));
                    }
                    CellOutcome::NoResponse => {
                        no_response_cells += 1;
                        out_row.insert(
                            config.output_field_name.clone(),
                            Some(NO_RESPONSE.to_string()),
                        );
                    }
                    CellOutcome::ApiError(_) => {
                        api_error_cells += 1;
                        out_row.insert(
                            config.output_field_name.clone(),
                            Some(API_ERROR.to_string()),
                        );
                    }
                    CellOutcome::RateLimited(_) => {
                        // The in-flight row is abandoned; it reruns on resume.
                        let state = self.store.update_run_state(table_id, &mut |s| {
                            s.status = RunStatus::Paused;
                            s.processed_rows = index;
                            s.total_rows = total;
                            s.progress_percent = RunState::percent(index, total);
                            s.error_detail = None;
                        })?;
                        self.observer.notify(RunEvent::State { table_id, state });
                        return Ok(RunOutcome {
                            rows: enriched,
                            next_row: index,
                            end: RunEnd::Paused,
                        });
                    }
                    CellOutcome::Fatal(detail) => {
                        self.set_state(table_id, RunState::error(index, total, detail.clone()))?;
                        return Err(RunError::Auth(detail));
                    }
                }
            }

            enriched.push(out_row);
            let processed = index + 1;
            // Only counters here — an externally-requested pause/stop that
            // landed mid-row must survive until the next boundary poll.
            let snapshot = self.store.update_run_state(table_id, &mut |s| {
                s.processed_rows = processed;
                s.total_rows = total;
                s.progress_percent = RunState::percent(processed, total);
            })?;
            self.observer.notify(RunEvent::State {
                table_id,
                state: snapshot,
            });
        }

        self.set_state(table_id, RunState::completed(total))?;
        let summary = if no_response_cells == 0 && api_error_cells == 0 {
            format!("Enrichment complete: {total} rows processed")
        } else {
            format!(
                "Enrichment complete: {total} rows processed \
                 ({no_response_cells} NO_RESPONSE, {api_error_cells} API_ERROR)"
            )
        };
        logger.log(LogLevel::Success, summary);
        tracing::info!(table_id, total_rows = total, "enrichment run completed");

        Ok(RunOutcome {
            rows: enriched,
            next_row: total,
            end: RunEnd::Completed,
        })
    }

    fn logger(&self, table_id: TableId) -> RunLogger<'_> {
        RunLogger {
            store: &*self.store,
            observer: &*self.observer,
            table_id,
        }
    }

    fn set_state(&self, table_id: TableId, state: RunState) -> Result<(), StoreError> {
        self.store.set_run_state(table_id, state.clone())?;
        self.observer.notify(RunEvent::State { table_id, state });
        Ok(())
    }
}
