//! Room lifecycle: join, password-gated join, leave, disconnect.
//!
//! Capacity checks and member mutations happen under the room's mutex, and
//! departure/arrival notifications are issued while that lock is still
//! held, so every member observes membership changes in one consistent
//! order. Authority calls are made outside the lock — they are bounded
//! network I/O and must not stall the room.

use std::sync::Arc;

use parley_core::{ConnectionId, RelayError, RoomId, ServerEvent};
use tracing::{debug, info, instrument, warn};

use crate::authority::{AuthorityError, RoomAuthority};
use crate::registry::RoomRegistry;

/// Delivery hook invoked while the room lock is held.
///
/// Implementations must not block: the server's implementation pushes onto
/// per-connection channels.
pub trait RoomNotifier: Send + Sync {
    /// Deliver `event` to every listed connection.
    fn notify(&self, targets: &[ConnectionId], event: &ServerEvent);
}

/// Reply to a join attempt, delivered to the requester only.
#[derive(Debug)]
pub enum JoinReply {
    /// Admitted; existing members were sent `ready`.
    Admitted,
    /// The room is at capacity.
    Full,
    /// The room is private; resend with a password.
    Challenge,
    /// Join failed: authentication or authority trouble.
    Rejected(RelayError),
}

/// Which departure signal remaining members receive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepartReason {
    /// Explicit `leave` event.
    Leave,
    /// Disconnect — peers should tear down their end of any peer session.
    End,
}

/// Join/leave/disconnect coordinator over the registry.
pub struct RoomLifecycle {
    registry: Arc<RoomRegistry>,
    authority: Arc<dyn RoomAuthority>,
}

impl RoomLifecycle {
    /// Create a lifecycle controller.
    pub fn new(registry: Arc<RoomRegistry>, authority: Arc<dyn RoomAuthority>) -> Self {
        Self {
            registry,
            authority,
        }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Handle a `join` event.
    ///
    /// Consults the authority first; a private room answers with a password
    /// challenge instead of admitting. An unknown room is created lazily,
    /// so the first joiner always succeeds.
    #[instrument(skip(self, notifier), fields(connection = %connection, room = %room))]
    pub async fn join(
        &self,
        connection: &ConnectionId,
        user: &str,
        room: &RoomId,
        notifier: &dyn RoomNotifier,
    ) -> JoinReply {
        match self.authority.room_meta(room).await {
            Ok(Some(meta)) if meta.private => {
                debug!("private room, challenging for password");
                return JoinReply::Challenge;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "authority lookup failed during join");
                return JoinReply::Rejected(RelayError::AuthorityUnavailable(e.to_string()));
            }
        }
        self.admit(connection, user, room, notifier).await
    }

    /// Handle a `join_with_password` event.
    ///
    /// The password is forwarded to the authority's membership registration;
    /// only a reported success admits the member locally.
    #[instrument(skip(self, password, notifier), fields(connection = %connection, room = %room))]
    pub async fn join_with_password(
        &self,
        connection: &ConnectionId,
        user: &str,
        room: &RoomId,
        password: &str,
        notifier: &dyn RoomNotifier,
    ) -> JoinReply {
        match self
            .authority
            .register_member(room, connection, user, Some(password))
            .await
        {
            Ok(()) => {}
            Err(AuthorityError::Rejected(detail)) => {
                info!(detail, "authority rejected credentials");
                return JoinReply::Rejected(RelayError::AuthenticationFailed);
            }
            Err(e @ AuthorityError::Unavailable(_)) => {
                warn!(error = %e, "authority unavailable during authenticated join");
                return JoinReply::Rejected(RelayError::AuthorityUnavailable(e.to_string()));
            }
        }

        let reply = self.admit(connection, user, room, notifier).await;
        if matches!(reply, JoinReply::Full) {
            // The authority admitted but we are full; undo the remote
            // registration best-effort so external state converges.
            if let Err(e) = self.authority.deregister_member(room, connection).await {
                warn!(error = %e, "failed to undo authority registration after full room");
            }
        }
        reply
    }

    /// Admit into the local room record under its serialization token.
    async fn admit(
        &self,
        connection: &ConnectionId,
        user: &str,
        room: &RoomId,
        notifier: &dyn RoomNotifier,
    ) -> JoinReply {
        loop {
            let record = self.registry.room_or_create(room);
            let mut guard = record.lock().await;
            // A racing teardown retired this record after we resolved it;
            // resolve again to get (or create) the live one.
            if guard.is_retired() {
                continue;
            }
            if guard.contains(connection) {
                debug!("duplicate join, already a member");
                return JoinReply::Admitted;
            }
            if guard.is_full() {
                info!(capacity = guard.capacity(), "join rejected, room full");
                return JoinReply::Full;
            }
            guard
                .admit(connection.clone())
                .expect("capacity checked under the room lock");
            self.registry.ensure_connection(connection, user);
            self.registry.register_join(connection, room);
            info!(members = guard.members().len(), "member admitted");

            let peers: Vec<ConnectionId> = guard
                .members()
                .iter()
                .filter(|m| *m != connection)
                .cloned()
                .collect();
            if !peers.is_empty() {
                notifier.notify(
                    &peers,
                    &ServerEvent::Ready {
                        user: user.to_string(),
                        from_connection: connection.clone(),
                    },
                );
            }
            return JoinReply::Admitted;
        }
    }

    /// Relay an event to every member of a room except the sender.
    ///
    /// Membership is checked and delivery issued under the room's mutex,
    /// the same discipline as the join/leave notifications, so every
    /// member observes relays and membership changes in one consistent
    /// order.
    #[instrument(skip(self, event, notifier), fields(connection = %sender, room = %room))]
    pub async fn relay(
        &self,
        sender: &ConnectionId,
        room: &RoomId,
        event: &ServerEvent,
        notifier: &dyn RoomNotifier,
    ) -> Result<(), RelayError> {
        let Some(record) = self.registry.room(room) else {
            debug!("relay to unknown room");
            return Err(RelayError::RoomNotFound(room.clone()));
        };
        let guard = record.lock().await;
        if !guard.contains(sender) {
            debug!("relay from non-member");
            return Err(RelayError::NotAMember {
                connection: sender.clone(),
                room: room.clone(),
            });
        }
        let peers: Vec<ConnectionId> = guard
            .members()
            .iter()
            .filter(|m| *m != sender)
            .cloned()
            .collect();
        if !peers.is_empty() {
            notifier.notify(&peers, event);
        }
        Ok(())
    }

    /// Handle a `leave` event (or one room of a disconnect).
    ///
    /// Idempotent: leaving a room not joined is a no-op and sends nothing.
    /// When the last member leaves, the room record is torn down entirely;
    /// a later join recreates it fresh. Returns whether the connection was
    /// a member.
    #[instrument(skip(self, notifier), fields(connection = %connection, room = %room))]
    pub async fn leave(
        &self,
        connection: &ConnectionId,
        room: &RoomId,
        reason: DepartReason,
        notifier: &dyn RoomNotifier,
    ) -> bool {
        let Some(record) = self.registry.room(room) else {
            debug!("leave for unknown room, ignoring");
            return false;
        };

        let removed = {
            let mut guard = record.lock().await;
            if !guard.remove(connection) {
                debug!("leave from non-member, ignoring");
                false
            } else {
                self.registry.register_leave(connection, room);
                let remaining = guard.members().to_vec();
                if remaining.is_empty() {
                    guard.retire();
                    self.registry.remove_room(room);
                    info!("last member left, room torn down");
                } else {
                    let event = match reason {
                        DepartReason::Leave => ServerEvent::Leave {
                            from_connection: connection.clone(),
                        },
                        DepartReason::End => ServerEvent::End {
                            from_connection: connection.clone(),
                        },
                    };
                    notifier.notify(&remaining, &event);
                    info!(remaining = remaining.len(), "member left");
                }
                true
            }
        };

        if removed {
            // External deregistration is best-effort: a failure leaves the
            // authority transiently stale, which is acceptable — local
            // state is authoritative for relay correctness.
            if let Err(e) = self.authority.deregister_member(room, connection).await {
                warn!(error = %e, "authority deregistration failed, not retried");
            }
        }
        removed
    }

    /// Handle a disconnect: leave every joined room in join order, with
    /// `end` departure semantics, then destroy the connection record.
    /// Idempotent for duplicate disconnects.
    #[instrument(skip(self, notifier), fields(connection = %connection))]
    pub async fn disconnect(&self, connection: &ConnectionId, notifier: &dyn RoomNotifier) {
        let Some(info) = self.registry.remove_connection(connection) else {
            debug!("duplicate disconnect, ignoring");
            return;
        };
        info!(rooms = info.rooms.len(), user = %info.user, "connection disconnected");
        for room in &info.rooms {
            let _ = self.leave(connection, room, DepartReason::End, notifier).await;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
