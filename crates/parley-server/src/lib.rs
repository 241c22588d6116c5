//! WebSocket relay server.
//!
//! Wires the room lifecycle, topic tracker, and enrichment bridge behind
//! an axum router: `GET /ws` upgrades to the relay protocol, `GET /health`
//! reports liveness, `GET /metrics` renders Prometheus text.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `websocket` | Upgrade, dispatch, fan-out |
//! | `enrichment` | Topic-change → fact/news delivery |
//! | `routes` | Router assembly + startup |
//! | `state` | Shared handler state graph |
//! | `metrics` | Recorder install + metric name constants |

pub mod enrichment;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod websocket;

#[cfg(test)]
mod testutil;

pub use enrichment::EnrichmentBridge;
pub use routes::{build_router, start, ServerHandle};
pub use state::AppState;
