//! Router assembly and server startup.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::state::AppState;
use crate::websocket::connection::ws_handler;

/// Build the axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Create and start the server. Returns a handle holding the bound port.
pub async fn start(state: AppState) -> Result<ServerHandle, std::io::Error> {
    let addr = format!(
        "{}:{}",
        state.settings.server.bind_addr, state.settings.server.ws_port
    );
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    info!(port = local_addr.port(), "relay server started");

    let server = tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        _server: server,
    })
}

/// Handle returned by [`start`] — keeps the accept loop alive.
pub struct ServerHandle {
    /// Bound port (useful when configured as 0).
    pub port: u16,
    _server: tokio::task::JoinHandle<()>,
}

/// Health check HTTP endpoint.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "version": state.settings.version,
        "rooms": state.registry.room_count(),
        "connections": state.broadcast.connection_count(),
    }))
}

/// Prometheus text exposition endpoint.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    crate::metrics::render(&state.metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_state;

    #[test]
    fn build_router_creates_routes() {
        let _router = build_router(test_state());
        // If this doesn't panic, the router was built successfully
    }

    #[tokio::test]
    async fn server_starts_and_serves_health() {
        let mut state = test_state();
        {
            let settings = std::sync::Arc::make_mut(&mut state.settings);
            settings.server.bind_addr = "127.0.0.1".into();
            settings.server.ws_port = 0; // random port
        }
        let handle = start(state).await.unwrap();
        assert!(handle.port > 0);

        let url = format!("http://127.0.0.1:{}/health", handle.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["rooms"], 0);
    }

    #[tokio::test]
    async fn metrics_endpoint_renders_text() {
        let mut state = test_state();
        {
            let settings = std::sync::Arc::make_mut(&mut state.settings);
            settings.server.bind_addr = "127.0.0.1".into();
            settings.server.ws_port = 0;
        }
        let handle = start(state).await.unwrap();

        let url = format!("http://127.0.0.1:{}/metrics", handle.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), 200);
        // Prometheus text format (possibly empty before any recordings)
        let _body = resp.text().await.unwrap();
    }
}
