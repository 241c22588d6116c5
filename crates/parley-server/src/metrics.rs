//! Prometheus metrics recorder and `/metrics` endpoint handler.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Must be called once at server startup before any metrics are recorded.
pub fn install_recorder() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Metric name constants to avoid typos across crates.

/// WebSocket connections opened total (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// WebSocket disconnections total (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Active WebSocket connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Broadcast drops total (counter).
pub const WS_BROADCAST_DROPS_TOTAL: &str = "ws_broadcast_drops_total";
/// WebSocket connection duration seconds (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "ws_connection_duration_seconds";
/// Relay events handled total (counter, labels: kind).
pub const RELAY_EVENTS_TOTAL: &str = "relay_events_total";
/// Joins rejected because the room was at capacity (counter).
pub const ROOM_FULL_REJECTIONS_TOTAL: &str = "room_full_rejections_total";
/// Live rooms (gauge).
pub const ROOMS_ACTIVE: &str = "rooms_active";
/// Enrichment lookups triggered by a topic change (counter).
pub const ENRICHMENT_TRIGGERED_TOTAL: &str = "enrichment_triggered_total";
/// Enrichment results relayed to a room (counter).
pub const ENRICHMENT_DELIVERED_TOTAL: &str = "enrichment_delivered_total";
/// Enrichment results discarded as stale (counter).
pub const ENRICHMENT_STALE_TOTAL: &str = "enrichment_stale_total";
/// Enrichment lookup duration seconds (histogram).
pub const ENRICHMENT_LOOKUP_DURATION_SECONDS: &str = "enrichment_lookup_duration_seconds";
