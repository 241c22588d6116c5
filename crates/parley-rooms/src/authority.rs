//! Room Authority collaborator seam.
//!
//! The authority owns room metadata and passwords for private rooms. The
//! relay only needs the three calls below; the HTTP implementation lives in
//! `parley-enrich`, and deployments without an authority use
//! [`DisabledAuthority`].

use async_trait::async_trait;
use parley_core::{ConnectionId, RoomId};

/// Room metadata held by the authority.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomMeta {
    /// Whether admission requires a password.
    pub private: bool,
}

/// Failures from the Room Authority.
#[derive(Debug, thiserror::Error)]
pub enum AuthorityError {
    /// The authority answered and refused — wrong password, unknown
    /// member, or a policy rejection. Carries the authority's detail.
    #[error("{0}")]
    Rejected(String),

    /// Timeout, connection failure, or 5xx.
    #[error("{0}")]
    Unavailable(String),
}

/// External service owning room metadata and passwords.
#[async_trait]
pub trait RoomAuthority: Send + Sync {
    /// Fetch room metadata. `Ok(None)` means the authority has no record —
    /// the room is treated as public.
    async fn room_meta(&self, room: &RoomId) -> Result<Option<RoomMeta>, AuthorityError>;

    /// Register a member, checking the password for private rooms.
    async fn register_member(
        &self,
        room: &RoomId,
        connection: &ConnectionId,
        user: &str,
        password: Option<&str>,
    ) -> Result<(), AuthorityError>;

    /// Deregister a member. Failures here are logged by callers, never
    /// retried, and never block local cleanup.
    async fn deregister_member(
        &self,
        room: &RoomId,
        connection: &ConnectionId,
    ) -> Result<(), AuthorityError>;
}

/// Authority stand-in for deployments without one: every room is public
/// and every membership call succeeds locally.
pub struct DisabledAuthority;

#[async_trait]
impl RoomAuthority for DisabledAuthority {
    async fn room_meta(&self, _room: &RoomId) -> Result<Option<RoomMeta>, AuthorityError> {
        Ok(None)
    }

    async fn register_member(
        &self,
        _room: &RoomId,
        _connection: &ConnectionId,
        _user: &str,
        _password: Option<&str>,
    ) -> Result<(), AuthorityError> {
        Ok(())
    }

    async fn deregister_member(
        &self,
        _room: &RoomId,
        _connection: &ConnectionId,
    ) -> Result<(), AuthorityError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_authority_treats_everything_as_public() {
        let auth = DisabledAuthority;
        assert_eq!(auth.room_meta(&"any".into()).await.unwrap(), None);
        auth.register_member(&"any".into(), &"c1".into(), "alice", None)
            .await
            .unwrap();
        auth.deregister_member(&"any".into(), &"c1".into())
            .await
            .unwrap();
    }

    #[test]
    fn authority_error_preserves_detail() {
        let e = AuthorityError::Rejected("wrong password".into());
        assert_eq!(e.to_string(), "wrong password");
        let e = AuthorityError::Unavailable("timeout after 3000ms".into());
        assert_eq!(e.to_string(), "timeout after 3000ms");
    }
}
