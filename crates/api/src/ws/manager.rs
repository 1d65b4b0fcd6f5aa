//! Device connection manager.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use rollcall_core::types::Timestamp;
use tokio::sync::{mpsc, RwLock};

use crate::engine::DeviceIdentity;

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single device connection.
pub struct DeviceConnection {
    /// Room binding, set after a successful `authenticate` handshake.
    /// Scans on connections without one are rejected.
    pub identity: Option<DeviceIdentity>,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
}

/// Manages all active device connections.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
pub struct DeviceManager {
    connections: RwLock<HashMap<String, DeviceConnection>>,
}

impl DeviceManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new (not yet authenticated) connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(&self, conn_id: String) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = DeviceConnection {
            identity: None,
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Bind a connection to its device's room after a successful handshake.
    ///
    /// Returns `false` when the connection is no longer registered.
    pub async fn authenticate(&self, conn_id: &str, identity: DeviceIdentity) -> bool {
        let mut conns = self.connections.write().await;
        match conns.get_mut(conn_id) {
            Some(conn) => {
                conn.identity = Some(identity);
                true
            }
            None => false,
        }
    }

    /// The room binding for a connection, if it has authenticated.
    pub async fn identity(&self, conn_id: &str) -> Option<DeviceIdentity> {
        self.connections
            .read()
            .await
            .get(conn_id)
            .and_then(|conn| conn.identity.clone())
    }

    /// Send a message to one connection.
    ///
    /// Returns `false` when the connection is gone or its channel closed.
    pub async fn send_to(&self, conn_id: &str, message: Message) -> bool {
        match self.connections.read().await.get(conn_id) {
            Some(conn) => conn.sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Number of authenticated connections bound to a room.
    pub async fn count_for_room(&self, organization_id: i64, room: &str) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|conn| {
                conn.identity.as_ref().is_some_and(|identity| {
                    identity.organization_id == organization_id && identity.room == room
                })
            })
            .count()
    }

    /// Send a Ping frame to every connected device.
    ///
    /// Used by the heartbeat task to keep connections alive and detect
    /// stale ones.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown to notify all devices before the
    /// server stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all device connections");
    }
}

impl Default for DeviceManager {
    fn default() -> Self {
        Self::new()
    }
}
