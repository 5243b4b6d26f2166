// crates/server/src/routes/process.rs
//! Run control routes.
//!
//! - POST /tables/{id}/process/start  — Begin an enrichment run (202)
//! - POST /tables/{id}/process/pause  — Request pause at the next row boundary
//! - POST /tables/{id}/process/resume — Resume from the next unprocessed row
//! - POST /tables/{id}/process/stop   — Stop the run
//! - GET  /tables/{id}/process/status — Current run state

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use rowforge_core::{ControlRequest, RunStatus, TableId, TableStore};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Response for the control endpoints: the status after the request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlResponse {
    pub status: RunStatus,
}

/// Spawn the engine run as a background task and fold its outcome into the
/// table's session when it returns.
fn spawn_run(state: Arc<AppState>, table_id: TableId, start_row: usize) {
    tokio::spawn(async move {
        match state.engine.run(table_id, start_row).await {
            Ok(outcome) => {
                tracing::info!(
                    table_id,
                    rows = outcome.rows.len(),
                    next_row = outcome.next_row,
                    end = ?outcome.end,
                    "enrichment run returned"
                );
                state.record_outcome(table_id, outcome);
            }
            Err(e) => {
                // Run state and the run log already carry the failure.
                tracing::error!(table_id, error = %e, "enrichment run failed");
                state.mark_inactive(table_id);
            }
        }
    });
}

/// POST /api/tables/{id}/process/start — Begin a fresh enrichment run.
pub async fn start_processing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TableId>,
) -> ApiResult<impl IntoResponse> {
    let configs = state.store.get_template_configs(id)?;
    if configs.is_empty() {
        return Err(ApiError::BadRequest(
            "no template configurations defined for this table".to_string(),
        ));
    }

    // A prior run that was paused/stopped may still be draining its current
    // row; starting again would double-run the table.
    if state.with_session(id, |s| s.active) {
        return Err(ApiError::Conflict(
            "a run is still in flight for this table".to_string(),
        ));
    }

    let run_state = state.engine.control(id, ControlRequest::Start)?;
    state.with_session(id, |s| {
        s.rows.clear();
        s.next_row = 0;
        s.active = true;
    });
    spawn_run(state.clone(), id, 0);

    Ok((
        StatusCode::ACCEPTED,
        Json(ControlResponse {
            status: run_state.status,
        }),
    ))
}

/// POST /api/tables/{id}/process/pause — Request a pause. Takes effect at
/// the next row boundary; the in-flight row finishes first.
pub async fn pause_processing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TableId>,
) -> ApiResult<impl IntoResponse> {
    let run_state = state.engine.control(id, ControlRequest::Pause)?;
    Ok(Json(ControlResponse {
        status: run_state.status,
    }))
}

/// POST /api/tables/{id}/process/resume — Resume a paused run from the next
/// unprocessed row.
pub async fn resume_processing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TableId>,
) -> ApiResult<impl IntoResponse> {
    if state.with_session(id, |s| s.active) {
        return Err(ApiError::Conflict(
            "the paused run is still winding down; retry shortly".to_string(),
        ));
    }

    let run_state = state.engine.control(id, ControlRequest::Resume)?;
    let start_row = state.with_session(id, |s| {
        s.active = true;
        s.next_row
    });
    spawn_run(state.clone(), id, start_row);

    Ok(Json(ControlResponse {
        status: run_state.status,
    }))
}

/// POST /api/tables/{id}/process/stop — Stop the run. Takes effect at the
/// next row boundary; already-enriched rows remain exportable.
pub async fn stop_processing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TableId>,
) -> ApiResult<impl IntoResponse> {
    let run_state = state.engine.control(id, ControlRequest::Stop)?;
    Ok(Json(ControlResponse {
        status: run_state.status,
    }))
}

/// GET /api/tables/{id}/process/status — Current run state.
pub async fn processing_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TableId>,
) -> ApiResult<impl IntoResponse> {
    let run_state = state.store.get_run_state(id)?;
    Ok(Json(run_state))
}

/// Create the process routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tables/{id}/process/start", post(start_processing))
        .route("/tables/{id}/process/pause", post(pause_processing))
        .route("/tables/{id}/process/resume", post(resume_processing))
        .route("/tables/{id}/process/stop", post(stop_processing))
        .route("/tables/{id}/process/status", get(processing_status))
}
