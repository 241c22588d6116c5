//! WebSocket upgrade and per-connection read/write loops.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use parley_core::ConnectionId;
use tokio::sync::mpsc;
use tracing::info;

use crate::metrics::{
    WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_CONNECTION_DURATION_SECONDS,
    WS_DISCONNECTIONS_TOTAL,
};
use crate::state::AppState;
use crate::websocket::broadcast::ClientConnection;
use crate::websocket::dispatch;

/// Ping cadence for connection liveness.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Outbound queue depth per connection before sends start dropping.
const OUTBOUND_QUEUE: usize = 256;

/// WebSocket upgrade handler for `/ws`.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one client connection until the transport closes.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let id = ConnectionId::generate();
    let (tx, mut rx) = mpsc::channel::<Arc<String>>(OUTBOUND_QUEUE);
    let conn = Arc::new(ClientConnection::new(id.clone(), tx));
    state.broadcast.add(Arc::clone(&conn));
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).set(state.broadcast.connection_count() as f64);
    info!(connection = %id, "client connected");

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Writer task: forward queued events to the socket + periodic ping.
    let writer = tokio::spawn(async move {
        let mut ping_interval = tokio::time::interval(HEARTBEAT_INTERVAL);
        ping_interval.tick().await; // consume first immediate tick
        loop {
            tokio::select! {
                msg = rx.recv() => {
                    match msg {
                        Some(text) => {
                            if ws_tx.send(WsMessage::Text(text.as_str().into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ping_interval.tick() => {
                    if ws_tx.send(WsMessage::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Reader loop: dispatch text frames until the peer goes away.
    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            WsMessage::Text(text) => {
                dispatch::handle_client_text(&state, &id, text.as_str()).await;
            }
            WsMessage::Close(_) => break,
            // axum answers pings automatically
            _ => {}
        }
    }

    // Transport gone: tear down memberships, then the fan-out entry. The
    // disconnect path is idempotent, so an explicit `disconnect` event
    // followed by the socket close is harmless.
    state.lifecycle.disconnect(&id, &*state.broadcast).await;
    state.broadcast.remove(&id);
    writer.abort();
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).set(state.broadcast.connection_count() as f64);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(conn.age().as_secs_f64());
    info!(connection = %id, "client disconnected");
}
