//! Device gateway socket handling.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use sha2::{Digest, Sha256};

use rollcall_core::admission::DecisionCode;
use rollcall_db::repositories::DeviceRepo;

use crate::engine::{self, DeviceIdentity, ScanOutcome};
use crate::state::AppState;
use crate::ws::protocol::{self, ClientMessage, ServerMessage};

/// HTTP handler that upgrades the connection to WebSocket.
///
/// After the upgrade the connection is registered with `DeviceManager`
/// and managed by two spawned tasks (sender + receiver).
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Manage a single device connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `DeviceManager`.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Processes inbound messages on the current task, one at a time, so
///      each scan receives its decision before the next is read
///      (per-connection FIFO).
///   4. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "Device connected");

    let device_manager = Arc::clone(&state.device_manager);

    // Register and get the receiver for outbound messages.
    let mut rx = device_manager.add(conn_id.clone()).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "Device sink closed");
                break;
            }
        }
    });

    // Receiver loop: process inbound messages sequentially.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => {
                let reply = handle_message(&state, &conn_id, text.as_str()).await;
                device_manager
                    .send_to(&conn_id, Message::Text(reply.to_json().into()))
                    .await;
            }
            Ok(_msg) => {
                // Binary and other frames are not part of the protocol.
            }
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "Device receive error");
                break;
            }
        }
    }

    // Clean up: remove connection and abort sender task.
    device_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "Device disconnected");
}

/// Process one inbound frame and build the reply.
async fn handle_message(state: &AppState, conn_id: &str, text: &str) -> ServerMessage {
    let message = match protocol::parse_message(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(conn_id = %conn_id, error = %e, "Malformed device frame");
            return ServerMessage::Error {
                message: format!("malformed message: {e}"),
            };
        }
    };

    match message {
        ClientMessage::Authenticate { device_key } => {
            authenticate(state, conn_id, &device_key).await
        }
        ClientMessage::RfidScan { rfid_tag } => scan(state, conn_id, &rfid_tag).await,
    }
}

/// Handshake: resolve the presented key to a registered device and bind
/// the connection to its room.
async fn authenticate(state: &AppState, conn_id: &str, device_key: &str) -> ServerMessage {
    let key_hash = hex::encode(Sha256::digest(device_key.as_bytes()));

    let device = match DeviceRepo::find_by_key_hash(&state.pool, &key_hash).await {
        Ok(device) => device,
        Err(e) => {
            tracing::error!(conn_id = %conn_id, error = %e, "Device lookup failed");
            return ServerMessage::AuthFailed {
                reason: "temporary failure, retry".to_string(),
            };
        }
    };

    let Some(device) = device else {
        tracing::info!(conn_id = %conn_id, "Authentication failed: unknown device key");
        return ServerMessage::AuthFailed {
            reason: "unknown or inactive device".to_string(),
        };
    };

    let identity = DeviceIdentity {
        device_id: device.id,
        organization_id: device.organization_id,
        room: device.room.clone(),
    };
    state
        .device_manager
        .authenticate(conn_id, identity)
        .await;

    if let Err(e) = DeviceRepo::touch_last_seen(&state.pool, device.id, chrono::Utc::now()).await {
        tracing::debug!(device_id = device.id, error = %e, "Failed to stamp last_seen");
    }

    tracing::info!(conn_id = %conn_id, device_id = device.id, room = %device.room, "Device authenticated");
    ServerMessage::Authenticated { room: device.room }
}

/// Forward a scan to the admission engine, rejecting scans on
/// unauthenticated connections.
async fn scan(state: &AppState, conn_id: &str, rfid_tag: &str) -> ServerMessage {
    let Some(identity) = state.device_manager.identity(conn_id).await else {
        tracing::debug!(conn_id = %conn_id, "Scan on unauthenticated connection");
        return ServerMessage::scan_result(ScanOutcome::bare(DecisionCode::NotAuthenticated));
    };

    let now = chrono::Utc::now();
    let outcome = engine::process_scan(state, &identity, rfid_tag, now).await;

    if let Err(e) = DeviceRepo::touch_last_seen(&state.pool, identity.device_id, now).await {
        tracing::debug!(device_id = identity.device_id, error = %e, "Failed to stamp last_seen");
    }

    ServerMessage::scan_result(outcome)
}
