//! API route handlers for the rowforge server.

pub mod events;
pub mod export;
pub mod health;
pub mod logs;
pub mod process;
pub mod tables;
pub mod templates;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET  /api/health - Health check
/// - POST /api/tables - Upload a table (JSON or text/csv)
/// - GET  /api/tables/{id} - Table metadata
/// - GET  /api/tables/{id}/data - Full table data
/// - PUT  /api/tables/{id}/templates - Replace template configs wholesale
/// - GET  /api/tables/{id}/templates - List template configs
/// - DELETE /api/tables/{id}/templates/{config_id} - Delete one config
/// - GET  /api/tables/{id}/fields/autocomplete - Field-name suggestions
/// - POST /api/tables/{id}/process/start - Begin an enrichment run
/// - POST /api/tables/{id}/process/pause - Pause at the next row boundary
/// - POST /api/tables/{id}/process/resume - Resume from the next row
/// - POST /api/tables/{id}/process/stop - Stop the run
/// - GET  /api/tables/{id}/process/status - Current run state
/// - GET  /api/tables/{id}/logs - Run log entries
/// - DELETE /api/tables/{id}/logs - Clear the run log
/// - GET  /api/tables/{id}/export - Download enriched table as CSV
/// - GET  /api/events - WebSocket stream of run events
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", tables::router())
        .nest("/api", templates::router())
        .nest("/api", process::router())
        .nest("/api", logs::router())
        .nest("/api", export::router())
        .nest("/api", events::router())
        .with_state(state)
}
