// crates/server/src/routes/events.rs
//! WebSocket fan-out of run events.
//!
//! Every run state change and log entry is broadcast to all connected
//! clients as tagged JSON (`{"type":"state",...}` / `{"type":"log",...}`).

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use crate::state::AppState;

/// GET /api/events — upgrade to a WebSocket event stream.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();
    let mut rx = state.events_tx.subscribe();
    tracing::debug!("events subscriber connected");

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    let Ok(text) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "events subscriber lagged; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            msg = stream.next() => match msg {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // inbound payloads are ignored
                Some(Err(_)) => break,
            },
        }
    }

    tracing::debug!("events subscriber disconnected");
}

/// Create the events routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/events", get(ws_handler))
}
