//! # parley-core
//!
//! Foundation types for the Parley room relay.
//!
//! This crate provides the shared vocabulary that all other Parley crates
//! depend on:
//!
//! - **Branded IDs**: [`ids::ConnectionId`], [`ids::RoomId`] as newtypes
//! - **Wire events**: [`events::ClientEvent`] (inbound) and
//!   [`events::ServerEvent`] (outbound), one tagged variant per event kind
//! - **Errors**: [`errors::RelayError`] taxonomy via `thiserror`
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other parley crates.

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod ids;

pub use errors::RelayError;
pub use events::{ClientEvent, NewsItem, ServerEvent};
pub use ids::{ConnectionId, RoomId};
