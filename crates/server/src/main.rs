// crates/server/src/main.rs
//! rowforge server binary.
//!
//! Binds the HTTP server and serves the enrichment API. Generation endpoint
//! configuration comes from `ROWFORGE_GENERATION_*` environment variables.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use rowforge_core::generation::{GenerationConfig, HttpProvider};
use rowforge_server::{create_app, AppState};

/// Default port for the server.
const DEFAULT_PORT: u16 = 47310;

/// Get the server port from environment or use default.
fn get_port() -> u16 {
    std::env::var("ROWFORGE_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();

    let config = GenerationConfig::from_env();
    tracing::info!(
        endpoint = %config.endpoint,
        model = %config.model,
        timeout_secs = config.timeout_secs,
        key_configured = config.api_key.is_some(),
        "generation endpoint configured"
    );
    let provider = Arc::new(HttpProvider::new(config).map_err(|e| anyhow::anyhow!("{e}"))?);

    let state = AppState::new(provider);
    let app = create_app(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], get_port()));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    eprintln!(
        "rowforge v{} listening on http://{}",
        env!("CARGO_PKG_VERSION"),
        addr
    );
    axum::serve(listener, app).await?;

    Ok(())
}
