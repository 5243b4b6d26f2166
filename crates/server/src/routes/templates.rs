// crates/server/src/routes/templates.rs
//! Template configuration routes.
//!
//! - PUT    /tables/{id}/templates               — Replace configs wholesale
//! - GET    /tables/{id}/templates               — List configs
//! - DELETE /tables/{id}/templates/{config_id}   — Delete one config
//! - GET    /tables/{id}/fields/autocomplete?q=  — Field-name suggestions

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rowforge_core::template::validate_configs;
use rowforge_core::{autocomplete, TableId, TableStore, TemplateConfig};

use crate::error::ApiResult;
use crate::state::AppState;

/// One template configuration in a PUT body. Ids are assigned server-side
/// when absent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConfigRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub template_text: String,
    pub output_field_name: String,
}

/// Query parameter for GET .../fields/autocomplete.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AutocompleteQuery {
    pub q: String,
}

/// Response for GET .../fields/autocomplete.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteResponse {
    pub suggestions: Vec<String>,
}

/// PUT /api/tables/{id}/templates — Replace the table's template
/// configurations wholesale. The prior set is deleted.
pub async fn put_templates(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TableId>,
    Json(body): Json<Vec<TemplateConfigRequest>>,
) -> ApiResult<impl IntoResponse> {
    let meta = state.store.get_table(id)?;

    let configs: Vec<TemplateConfig> = body
        .into_iter()
        .map(|c| TemplateConfig {
            id: c.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            template_text: c.template_text,
            output_field_name: c.output_field_name,
        })
        .collect();

    validate_configs(&meta.field_names, &configs)?;
    state.store.set_template_configs(id, configs.clone())?;
    tracing::info!(table_id = id, count = configs.len(), "template configs replaced");

    Ok(Json(configs))
}

/// GET /api/tables/{id}/templates — List the table's configurations.
pub async fn get_templates(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TableId>,
) -> ApiResult<impl IntoResponse> {
    let configs = state.store.get_template_configs(id)?;
    Ok(Json(configs))
}

/// DELETE /api/tables/{id}/templates/{config_id} — Delete one configuration.
pub async fn delete_template(
    State(state): State<Arc<AppState>>,
    Path((id, config_id)): Path<(TableId, String)>,
) -> ApiResult<impl IntoResponse> {
    state.store.delete_template_config(id, &config_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/tables/{id}/fields/autocomplete — Rank field names against a
/// partial query.
pub async fn autocomplete_fields(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TableId>,
    Query(query): Query<AutocompleteQuery>,
) -> ApiResult<impl IntoResponse> {
    let meta = state.store.get_table(id)?;
    let suggestions = autocomplete::suggest(&query.q, &meta.field_names);
    Ok(Json(AutocompleteResponse { suggestions }))
}

/// Create the template routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/tables/{id}/templates",
            put(put_templates).get(get_templates),
        )
        .route(
            "/tables/{id}/templates/{config_id}",
            axum::routing::delete(delete_template),
        )
        .route("/tables/{id}/fields/autocomplete", get(autocomplete_fields))
}
