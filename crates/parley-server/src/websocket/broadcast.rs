//! Event fan-out to connected WebSocket clients.
//!
//! Delivery is synchronous and non-blocking: events are serialized once
//! and pushed onto per-connection channels with `try_send`, which lets
//! [`BroadcastManager`] double as the [`RoomNotifier`] invoked while a
//! room's lock is held.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use metrics::counter;
use parking_lot::RwLock;
use parley_core::{ConnectionId, ServerEvent};
use parley_rooms::RoomNotifier;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::metrics::WS_BROADCAST_DROPS_TOTAL;

/// Maximum total lifetime message drops before forcibly disconnecting a slow client.
const MAX_TOTAL_DROPS: u64 = 100;

/// Represents a connected WebSocket client.
pub struct ClientConnection {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// Send channel to the client's WebSocket write task.
    tx: mpsc::Sender<Arc<String>>,
    /// When this connection was established.
    pub connected_at: Instant,
    /// Count of messages dropped due to full channel.
    pub dropped_messages: AtomicU64,
}

impl ClientConnection {
    /// Create a new connection.
    pub fn new(id: ConnectionId, tx: mpsc::Sender<Arc<String>>) -> Self {
        Self {
            id,
            tx,
            connected_at: Instant::now(),
            dropped_messages: AtomicU64::new(0),
        }
    }

    /// Send a serialized message to the client.
    ///
    /// Returns `false` if the channel is full or closed, and increments
    /// the dropped message counter.
    pub fn send(&self, message: Arc<String>) -> bool {
        if self.tx.try_send(message).is_ok() {
            true
        } else {
            let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Total messages dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Connection age.
    pub fn age(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }
}

/// Manages event delivery to connected clients.
pub struct BroadcastManager {
    /// Connected clients indexed by connection ID.
    connections: RwLock<HashMap<ConnectionId, Arc<ClientConnection>>>,
    /// Atomic counter tracking total connections (avoids read-locking for count queries).
    active_count: AtomicUsize,
}

impl BroadcastManager {
    /// Create a new broadcast manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            active_count: AtomicUsize::new(0),
        }
    }

    /// Add a connection.
    pub fn add(&self, connection: Arc<ClientConnection>) {
        let mut conns = self.connections.write();
        if conns.insert(connection.id.clone(), connection).is_none() {
            let _ = self.active_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Remove a connection by ID.
    pub fn remove(&self, connection_id: &ConnectionId) {
        let mut conns = self.connections.write();
        if conns.remove(connection_id).is_some() {
            let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Deliver an event to a single connection. Returns `false` if the
    /// connection is unknown.
    pub fn send_to(&self, connection_id: &ConnectionId, event: &ServerEvent) -> bool {
        let Some(json) = serialize(event) else {
            return false;
        };
        let conn = self.connections.read().get(connection_id).cloned();
        match conn {
            Some(conn) => {
                if let Some(dead) = push(&conn, json) {
                    self.remove(&dead);
                }
                true
            }
            None => {
                debug!(connection = %connection_id, "send to unknown connection");
                false
            }
        }
    }

    /// Deliver an event to every listed connection, optionally excluding
    /// one (the sender of a room-scoped relay).
    pub fn send_to_many(
        &self,
        targets: &[ConnectionId],
        event: &ServerEvent,
        exclude: Option<&ConnectionId>,
    ) {
        let Some(json) = serialize(event) else {
            return;
        };
        let mut to_remove = Vec::new();
        {
            let conns = self.connections.read();
            let mut recipients = 0u32;
            for id in targets {
                if exclude == Some(id) {
                    continue;
                }
                if let Some(conn) = conns.get(id) {
                    recipients += 1;
                    if let Some(dead) = push(conn, Arc::clone(&json)) {
                        to_remove.push(dead);
                    }
                }
            }
            debug!(recipients, "event fanned out");
        }
        for id in &to_remove {
            self.remove(id);
        }
    }

    /// Number of active connections.
    pub fn connection_count(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

impl Default for BroadcastManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomNotifier for BroadcastManager {
    fn notify(&self, targets: &[ConnectionId], event: &ServerEvent) {
        self.send_to_many(targets, event, None);
    }
}

/// Push one serialized event, tracking drops. Returns the connection's id
/// when it has been slow past the lifetime threshold and should be removed
/// (removal happens outside any read lock held by the caller).
fn push(conn: &Arc<ClientConnection>, json: Arc<String>) -> Option<ConnectionId> {
    if conn.send(json) {
        return None;
    }
    counter!(WS_BROADCAST_DROPS_TOTAL).increment(1);
    let drops = conn.drop_count();
    if drops >= MAX_TOTAL_DROPS {
        warn!(connection = %conn.id, drops, "disconnecting slow client");
        Some(conn.id.clone())
    } else {
        warn!(connection = %conn.id, total_drops = drops, "failed to send event to client (channel full)");
        None
    }
}

fn serialize(event: &ServerEvent) -> Option<Arc<String>> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Arc::new(json)),
        Err(e) => {
            warn!(error = %e, "failed to serialize event");
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
