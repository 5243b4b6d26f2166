// crates/server/src/routes/tables.rs
//! Table upload and browse routes.
//!
//! - POST /tables           — Upload a table (JSON body or text/csv)
//! - GET  /tables/{id}      — Table metadata (field names + row count)
//! - GET  /tables/{id}/data — Full table data

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use rowforge_core::{Row, Table, TableId, TableStore};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// JSON request body for POST /api/tables.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub field_names: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

/// Response for POST /api/tables (201 Created).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub table_id: TableId,
    pub field_names: Vec<String>,
    pub row_count: usize,
}

/// POST /api/tables — Upload a table.
///
/// Accepts either a JSON body (`{fieldNames, rows}`) or a raw CSV document
/// with `Content-Type: text/csv`.
pub async fn upload_table(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let table = if content_type.starts_with("text/csv") {
        let text = std::str::from_utf8(&body)
            .map_err(|_| ApiError::BadRequest("CSV body must be valid UTF-8".to_string()))?;
        Table::from_csv(text)?
    } else {
        let request: UploadRequest = serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?;
        Table::new(request.field_names, request.rows)?
    };

    if table.field_names.is_empty() {
        return Err(ApiError::BadRequest(
            "table must have at least one field".to_string(),
        ));
    }

    let field_names = table.field_names.clone();
    let row_count = table.row_count();
    let table_id = state.store.insert_table(table);
    tracing::info!(table_id, row_count, fields = field_names.len(), "table uploaded");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            table_id,
            field_names,
            row_count,
        }),
    ))
}

/// GET /api/tables/{id} — Table metadata.
pub async fn get_table(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TableId>,
) -> ApiResult<impl IntoResponse> {
    let meta = state.store.get_table(id)?;
    Ok(Json(meta))
}

/// GET /api/tables/{id}/data — Full table data.
pub async fn get_table_data(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TableId>,
) -> ApiResult<impl IntoResponse> {
    let table = state.store.get_table_data(id)?;
    Ok(Json(table))
}

/// Create the table routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tables", post(upload_table))
        .route("/tables/{id}", get(get_table))
        .route("/tables/{id}/data", get(get_table_data))
}
