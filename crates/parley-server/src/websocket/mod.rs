//! WebSocket connection management, event dispatch, and fan-out.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `connection` | WebSocket upgrade, per-connection read/write loops |
//! | `dispatch` | Inbound event parsing and routing per delivery rule |
//! | `broadcast` | Fan-out manager: per-connection channels, slow-client handling |
//!
//! ## Data Flow
//!
//! `connection` → `dispatch` (lifecycle/relay/tracker) → `broadcast` → clients.
//! The enrichment bridge re-enters through `broadcast` when lookups complete.

pub mod broadcast;
pub mod connection;
pub mod dispatch;
