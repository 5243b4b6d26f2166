// crates/server/src/routes/export.rs
//! Export endpoint: download the enriched table as CSV.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use rowforge_core::export;
use rowforge_core::TableId;

use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/tables/{id}/export — Download the table as CSV.
///
/// Enriched rows accumulated so far carry their output columns; rows not
/// yet processed are included with those columns blank, so partial results
/// are exportable at any time.
pub async fn export_table(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TableId>,
) -> ApiResult<Response> {
    let enriched = state.session_rows(id);
    let csv = export::export(&*state.store, id, &enriched)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"table-{id}.csv\""),
            ),
        ],
        csv,
    )
        .into_response())
}

/// Create the export routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/tables/{id}/export", get(export_table))
}
