//! Wire event types for the room relay.
//!
//! Two event families:
//!
//! - **[`ClientEvent`]**: Inbound events parsed at the WebSocket boundary.
//!   One tagged variant per event kind with required fields; malformed or
//!   unknown events fail deserialization and are answered with
//!   [`ServerEvent::Error`] instead of crashing the dispatcher.
//! - **[`ServerEvent`]**: Outbound events delivered to one connection, to a
//!   room, or to all-but-sender, depending on the kind.
//!
//! Tags are snake_case, multi-word fields are camelCase on the wire.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{ConnectionId, RoomId};

// ─────────────────────────────────────────────────────────────────────────────
// ClientEvent — inbound
// ─────────────────────────────────────────────────────────────────────────────

/// Events a client may send to the relay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Request to join a room.
    Join {
        /// Display name of the joiner.
        user: String,
        /// Target room.
        room: RoomId,
    },

    /// Second-step join carrying the secret for a private room.
    JoinWithPassword {
        /// Display name of the joiner.
        user: String,
        /// Target room.
        room: RoomId,
        /// Room secret, checked by the Room Authority.
        password: String,
    },

    /// Leave a single room.
    Leave {
        /// Room to leave.
        room: RoomId,
    },

    /// Connection is going away; implicit on transport close.
    Disconnect,

    /// Point-to-point opaque payload to one named connection.
    Data {
        /// Recipient connection.
        to: ConnectionId,
        /// Opaque payload, relayed untouched.
        payload: Value,
    },

    /// Point-to-point user metadata to one named connection.
    UserInfo {
        /// Recipient connection.
        to: ConnectionId,
        /// Opaque payload, relayed untouched.
        payload: Value,
    },

    /// Chat text to a room (all members except the sender).
    Message {
        /// Display name of the sender.
        user: String,
        /// Target room.
        room: RoomId,
        /// Chat text.
        text: String,
    },

    /// Peer-session setup signal to a room, excluding the sender.
    StartConnection {
        /// Display name of the sender.
        user: String,
        /// Target room.
        room: RoomId,
    },

    /// Peer-session teardown signal to a room, excluding the sender.
    EndConnection {
        /// Target room.
        room: RoomId,
    },

    /// Live speech transcript; consumed by the topic tracker, not relayed.
    UserSpeech {
        /// Display name of the speaker.
        user: String,
        /// Target room.
        room: RoomId,
        /// Raw transcript text.
        transcript: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// ServerEvent — outbound
// ─────────────────────────────────────────────────────────────────────────────

/// One news headline with its source link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Headline text.
    pub headline: String,
    /// Link to the article.
    pub url: String,
}

/// Events the relay delivers to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A new member was admitted; sent to existing members, not the joiner.
    Ready {
        /// Display name of the new member.
        user: String,
        /// Connection id of the new member.
        #[serde(rename = "fromConnection")]
        from_connection: ConnectionId,
    },

    /// Join rejected: the room is at capacity. Sent to the requester only.
    RoomFull {
        /// Human-readable rejection detail.
        message: String,
    },

    /// Join succeeded; sent to the requester.
    Joined,

    /// The room is private; the requester must resend with a password.
    Password,

    /// Join failed for a reason other than capacity.
    JoinError {
        /// Failure detail, safe to show to the requester.
        detail: String,
    },

    /// A member left the room; sent to remaining members.
    Leave {
        /// Connection id of the departed member.
        #[serde(rename = "fromConnection")]
        from_connection: ConnectionId,
    },

    /// A member disconnected; remaining peers should tear down their end.
    End {
        /// Connection id of the departed member.
        #[serde(rename = "fromConnection")]
        from_connection: ConnectionId,
    },

    /// Point-to-point payload relay.
    Data {
        /// Opaque payload from the sender.
        payload: Value,
        /// Connection id of the sender.
        #[serde(rename = "fromConnection")]
        from_connection: ConnectionId,
    },

    /// Point-to-point user metadata relay.
    UserInfo {
        /// Opaque payload from the sender.
        payload: Value,
        /// Connection id of the sender.
        #[serde(rename = "fromConnection")]
        from_connection: ConnectionId,
    },

    /// Chat text relayed to room members.
    Message {
        /// Chat text.
        text: String,
        /// Display name of the sender.
        user: String,
    },

    /// One-sentence fact about the room's current topic.
    Fact {
        /// Fact sentence.
        text: String,
    },

    /// News headlines about the room's current topic. Never more than 3.
    News {
        /// Headlines with links.
        items: Vec<NewsItem>,
    },

    /// A malformed or failed event, scoped to the offending connection.
    Error {
        /// Failure detail.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_event_tags_are_snake_case() {
        let ev = ClientEvent::JoinWithPassword {
            user: "alice".into(),
            room: "priv1".into(),
            password: "s3cret".into(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "join_with_password");
        assert_eq!(json["room"], "priv1");
    }

    #[test]
    fn client_event_roundtrip() {
        let json = r#"{"type":"user_speech","user":"bob","room":"room1","transcript":"I love football"}"#;
        let ev: ClientEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            ev,
            ClientEvent::UserSpeech {
                user: "bob".into(),
                room: "room1".into(),
                transcript: "I love football".into(),
            }
        );
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let json = r#"{"type":"shutdown_everything"}"#;
        let result = serde_json::from_str::<ClientEvent>(json);
        assert!(result.is_err());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let json = r#"{"type":"join","user":"alice"}"#;
        let result = serde_json::from_str::<ClientEvent>(json);
        assert!(result.is_err());
    }

    #[test]
    fn disconnect_needs_no_fields() {
        let ev: ClientEvent = serde_json::from_str(r#"{"type":"disconnect"}"#).unwrap();
        assert_eq!(ev, ClientEvent::Disconnect);
    }

    #[test]
    fn server_event_from_connection_is_camel_case() {
        let ev = ServerEvent::Ready {
            user: "alice".into(),
            from_connection: "c1".into(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "ready");
        assert_eq!(json["fromConnection"], "c1");
        assert!(json.get("from_connection").is_none());
    }

    #[test]
    fn joined_serializes_as_bare_tag() {
        let json = serde_json::to_value(&ServerEvent::Joined).unwrap();
        assert_eq!(json, serde_json::json!({"type": "joined"}));
    }

    #[test]
    fn password_challenge_serializes_as_bare_tag() {
        let json = serde_json::to_value(&ServerEvent::Password).unwrap();
        assert_eq!(json, serde_json::json!({"type": "password"}));
    }

    #[test]
    fn news_items_shape() {
        let ev = ServerEvent::News {
            items: vec![NewsItem {
                headline: "Cup final tonight".into(),
                url: "https://example.com/cup".into(),
            }],
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["items"][0]["headline"], "Cup final tonight");
        assert_eq!(json["items"][0]["url"], "https://example.com/cup");
    }

    #[test]
    fn data_payload_is_opaque() {
        let payload = serde_json::json!({"sdp": "v=0...", "kind": "offer"});
        let ev = ClientEvent::Data {
            to: "c2".into(),
            payload: payload.clone(),
        };
        let json = serde_json::to_string(&ev).unwrap();
        let back: ClientEvent = serde_json::from_str(&json).unwrap();
        match back {
            ClientEvent::Data { payload: p, .. } => assert_eq!(p, payload),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
