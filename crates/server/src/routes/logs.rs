// crates/server/src/routes/logs.rs
//! Run log routes.
//!
//! - GET    /tables/{id}/logs — All log entries for the table, oldest first
//! - DELETE /tables/{id}/logs — Clear the log (run state is untouched)

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use rowforge_core::{TableId, TableStore};

use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/tables/{id}/logs
pub async fn get_logs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TableId>,
) -> ApiResult<impl IntoResponse> {
    let logs = state.store.get_logs(id)?;
    Ok(Json(logs))
}

/// DELETE /api/tables/{id}/logs
pub async fn clear_logs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TableId>,
) -> ApiResult<impl IntoResponse> {
    state.store.clear_logs(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create the log routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/tables/{id}/logs", get(get_logs).delete(clear_logs))
}
