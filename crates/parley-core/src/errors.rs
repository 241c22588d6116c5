//! Relay error taxonomy.

use crate::ids::{ConnectionId, RoomId};

/// Errors surfaced by the room coordination and relay engine.
///
/// `RoomFull` and `AuthenticationFailed` are surfaced to the requesting
/// client as rejection events. `AuthorityUnavailable` during join becomes a
/// `join_error`; during leave/disconnect it is logged and local cleanup
/// proceeds. `EnrichmentUnavailable` is swallowed entirely. None of these
/// terminate the process.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The room is at capacity.
    #[error("room is full")]
    RoomFull,

    /// The supplied password did not match the Room Authority's record.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The Room Authority timed out or answered 5xx.
    #[error("room authority unavailable: {0}")]
    AuthorityUnavailable(String),

    /// The named room does not exist.
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    /// The sender targeted a room or connection it is not part of.
    #[error("{connection} is not a member of {room}")]
    NotAMember {
        /// The offending sender.
        connection: ConnectionId,
        /// The room it targeted.
        room: RoomId,
    },

    /// A classifier/keyword/fact/news collaborator failed.
    #[error("enrichment unavailable: {0}")]
    EnrichmentUnavailable(String),
}
