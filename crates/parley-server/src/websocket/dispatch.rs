//! Inbound event parsing and routing.
//!
//! Every failure here is scoped to the offending connection: malformed
//! events are answered with an `error` event and the connection stays
//! open, join failures answer the requester only, and nothing a single
//! client sends can take the process down.

use metrics::{counter, gauge};
use parley_core::{ClientEvent, ConnectionId, RoomId, ServerEvent};
use parley_rooms::{DepartReason, JoinReply};
use tracing::{debug, instrument};

use crate::metrics::{RELAY_EVENTS_TOTAL, ROOMS_ACTIVE, ROOM_FULL_REJECTIONS_TOTAL};
use crate::state::AppState;

/// Event tag for the relay counter.
fn kind_of(event: &ClientEvent) -> &'static str {
    match event {
        ClientEvent::Join { .. } => "join",
        ClientEvent::JoinWithPassword { .. } => "join_with_password",
        ClientEvent::Leave { .. } => "leave",
        ClientEvent::Disconnect => "disconnect",
        ClientEvent::Data { .. } => "data",
        ClientEvent::UserInfo { .. } => "user_info",
        ClientEvent::Message { .. } => "message",
        ClientEvent::StartConnection { .. } => "start_connection",
        ClientEvent::EndConnection { .. } => "end_connection",
        ClientEvent::UserSpeech { .. } => "user_speech",
    }
}

/// Parse and handle one raw text frame from a client.
#[instrument(skip(state, raw), fields(connection = %connection))]
pub async fn handle_client_text(state: &AppState, connection: &ConnectionId, raw: &str) {
    let event: ClientEvent = match serde_json::from_str(raw) {
        Ok(event) => event,
        Err(e) => {
            debug!(error = %e, "malformed client event");
            counter!(RELAY_EVENTS_TOTAL, "kind" => "malformed").increment(1);
            let _ = state.broadcast.send_to(
                connection,
                &ServerEvent::Error {
                    message: format!("malformed event: {e}"),
                },
            );
            return;
        }
    };
    counter!(RELAY_EVENTS_TOTAL, "kind" => kind_of(&event)).increment(1);

    match event {
        ClientEvent::Join { user, room } => {
            let reply = state
                .lifecycle
                .join(connection, &user, &room, &*state.broadcast)
                .await;
            answer_join(state, connection, reply);
        }
        ClientEvent::JoinWithPassword {
            user,
            room,
            password,
        } => {
            let reply = state
                .lifecycle
                .join_with_password(connection, &user, &room, &password, &*state.broadcast)
                .await;
            answer_join(state, connection, reply);
        }
        ClientEvent::Leave { room } => {
            let _ = state
                .lifecycle
                .leave(connection, &room, DepartReason::Leave, &*state.broadcast)
                .await;
            gauge!(ROOMS_ACTIVE).set(state.registry.room_count() as f64);
        }
        ClientEvent::Disconnect => {
            state
                .lifecycle
                .disconnect(connection, &*state.broadcast)
                .await;
            gauge!(ROOMS_ACTIVE).set(state.registry.room_count() as f64);
        }
        ClientEvent::Data { to, payload } => {
            relay_direct(
                state,
                connection,
                &to,
                ServerEvent::Data {
                    payload,
                    from_connection: connection.clone(),
                },
            );
        }
        ClientEvent::UserInfo { to, payload } => {
            relay_direct(
                state,
                connection,
                &to,
                ServerEvent::UserInfo {
                    payload,
                    from_connection: connection.clone(),
                },
            );
        }
        ClientEvent::Message { user, room, text } => {
            relay_to_room(state, connection, &room, ServerEvent::Message { text, user }).await;
        }
        ClientEvent::StartConnection { user, room } => {
            relay_to_room(
                state,
                connection,
                &room,
                ServerEvent::Ready {
                    user,
                    from_connection: connection.clone(),
                },
            )
            .await;
        }
        ClientEvent::EndConnection { room } => {
            relay_to_room(
                state,
                connection,
                &room,
                ServerEvent::End {
                    from_connection: connection.clone(),
                },
            )
            .await;
        }
        ClientEvent::UserSpeech {
            user: _,
            room,
            transcript,
        } => {
            if let Some(change) = state.tracker.observe(&room, connection, &transcript).await {
                let _ = state.enrichment.spawn(change);
            }
        }
    }
}

/// Deliver a join outcome to the requester.
fn answer_join(state: &AppState, connection: &ConnectionId, reply: JoinReply) {
    let event = match reply {
        JoinReply::Admitted => {
            gauge!(ROOMS_ACTIVE).set(state.registry.room_count() as f64);
            ServerEvent::Joined
        }
        JoinReply::Full => {
            counter!(ROOM_FULL_REJECTIONS_TOTAL).increment(1);
            ServerEvent::RoomFull {
                message: "room is at capacity".to_string(),
            }
        }
        JoinReply::Challenge => ServerEvent::Password,
        JoinReply::Rejected(err) => ServerEvent::JoinError {
            detail: err.to_string(),
        },
    };
    let _ = state.broadcast.send_to(connection, &event);
}

/// Point-to-point relay to one named connection.
fn relay_direct(
    state: &AppState,
    sender: &ConnectionId,
    recipient: &ConnectionId,
    event: ServerEvent,
) {
    if !state.broadcast.send_to(recipient, &event) {
        let _ = state.broadcast.send_to(
            sender,
            &ServerEvent::Error {
                message: format!("unknown recipient: {recipient}"),
            },
        );
    }
}

/// Room-scoped relay, excluding the sender. Delivery happens under the
/// room's mutex alongside the membership notifications, so every member
/// observes relays and membership changes in one consistent order.
/// Senders outside the room get an error event instead of a relay.
async fn relay_to_room(state: &AppState, sender: &ConnectionId, room: &RoomId, event: ServerEvent) {
    if let Err(e) = state
        .lifecycle
        .relay(sender, room, &event, &*state.broadcast)
        .await
    {
        let _ = state.broadcast.send_to(
            sender,
            &ServerEvent::Error {
                message: e.to_string(),
            },
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
