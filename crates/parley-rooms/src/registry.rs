//! Registry of per-room serialized records and connection bookkeeping.
//!
//! Rooms are created explicitly on first join and removed explicitly when
//! the last member leaves — no ad hoc map-membership checks scattered
//! through handlers. The outer maps use `parking_lot` locks held only for
//! map operations; nothing awaits while holding them. The per-room
//! `tokio::sync::Mutex` inside each entry is the room's serialization
//! token.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use parley_core::{ConnectionId, RoomId};
use tokio::sync::Mutex;
use tracing::debug;

use crate::room::Room;

/// Per-connection identity and membership bookkeeping.
#[derive(Clone, Debug)]
pub struct ConnectionInfo {
    /// Display name supplied on the first join.
    pub user: String,
    /// Rooms currently joined, in join order.
    pub rooms: Vec<RoomId>,
}

/// Owner of all room records and connection state.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, Arc<Mutex<Room>>>>,
    connections: RwLock<HashMap<ConnectionId, ConnectionInfo>>,
    default_capacity: usize,
    window_capacity: usize,
}

impl RoomRegistry {
    /// Create an empty registry.
    pub fn new(default_capacity: usize, window_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            connections: RwLock::new(HashMap::new()),
            default_capacity,
            window_capacity,
        }
    }

    // ── rooms ──────────────────────────────────────────────────────────

    /// Look up an existing room record.
    pub fn room(&self, id: &RoomId) -> Option<Arc<Mutex<Room>>> {
        self.rooms.read().get(id).cloned()
    }

    /// Look up a room record, creating it with the default capacity if the
    /// id is not yet known.
    ///
    /// Callers must re-check [`Room::is_retired`] after locking: a racing
    /// teardown may have retired the record between resolution and lock
    /// acquisition, in which case the caller resolves again.
    pub fn room_or_create(&self, id: &RoomId) -> Arc<Mutex<Room>> {
        if let Some(room) = self.room(id) {
            return room;
        }
        let mut rooms = self.rooms.write();
        Arc::clone(rooms.entry(id.clone()).or_insert_with(|| {
            debug!(room = %id, "room created");
            Arc::new(Mutex::new(Room::new(
                id.clone(),
                self.default_capacity,
                self.window_capacity,
            )))
        }))
    }

    /// Drop a room record. Called under the room's own mutex after it was
    /// retired, so no new member can be admitted into the dropped record.
    pub fn remove_room(&self, id: &RoomId) {
        if self.rooms.write().remove(id).is_some() {
            debug!(room = %id, "room removed");
        }
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }

    /// Member connection ids of a room in insertion order. Empty if the
    /// room does not exist.
    pub async fn members_of(&self, id: &RoomId) -> Vec<ConnectionId> {
        match self.room(id) {
            Some(room) => room.lock().await.members().to_vec(),
            None => Vec::new(),
        }
    }

    // ── connections ────────────────────────────────────────────────────

    /// Create the connection record if this is the first event naming it.
    pub fn ensure_connection(&self, connection: &ConnectionId, user: &str) {
        let mut conns = self.connections.write();
        let _ = conns
            .entry(connection.clone())
            .or_insert_with(|| ConnectionInfo {
                user: user.to_string(),
                rooms: Vec::new(),
            });
    }

    /// Record that a connection joined a room (idempotent).
    pub fn register_join(&self, connection: &ConnectionId, room: &RoomId) {
        let mut conns = self.connections.write();
        if let Some(info) = conns.get_mut(connection) {
            if !info.rooms.contains(room) {
                info.rooms.push(room.clone());
            }
        }
    }

    /// Record that a connection left a room. Leaving a room never joined is
    /// a no-op.
    pub fn register_leave(&self, connection: &ConnectionId, room: &RoomId) {
        let mut conns = self.connections.write();
        if let Some(info) = conns.get_mut(connection) {
            info.rooms.retain(|r| r != room);
        }
    }

    /// Rooms a connection currently belongs to, in join order.
    pub fn rooms_of(&self, connection: &ConnectionId) -> Vec<RoomId> {
        self.connections
            .read()
            .get(connection)
            .map(|info| info.rooms.clone())
            .unwrap_or_default()
    }

    /// Destroy a connection record, returning its final state. `None` on a
    /// duplicate disconnect.
    pub fn remove_connection(&self, connection: &ConnectionId) -> Option<ConnectionInfo> {
        self.connections.write().remove(connection)
    }

    /// Number of known connections.
    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
