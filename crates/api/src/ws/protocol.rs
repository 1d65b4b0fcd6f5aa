//! Device gateway message types.
//!
//! Devices exchange JSON messages with the shape
//! `{"type": "<kind>", "data": {...}}`, deserialized via the
//! internally-tagged `"type"` field with associated `"data"` content.

use serde::{Deserialize, Serialize};

use crate::engine::ScanOutcome;
use rollcall_core::types::DbId;

/// Messages a device sends to the gateway.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Bind this connection to the device's room. Required before any
    /// scan is processed.
    Authenticate { device_key: String },

    /// An RFID tag was presented to the reader.
    RfidScan { rfid_tag: String },
}

/// Messages the gateway sends to a device.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Handshake succeeded; the connection is bound to `room`.
    Authenticated { room: String },

    /// Handshake failed.
    AuthFailed { reason: String },

    /// Terminal result for one scan. Exactly one per `rfid_scan`, in
    /// submission order.
    ScanResult {
        /// `"accepted"` or `"rejected"`.
        decision: &'static str,
        reason_code: &'static str,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<DbId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        substitution: Option<bool>,
    },

    /// A frame could not be parsed.
    Error { message: String },
}

impl ServerMessage {
    /// Build a `scan_result` from an engine outcome.
    pub fn scan_result(outcome: ScanOutcome) -> Self {
        ServerMessage::ScanResult {
            decision: if outcome.code.is_accepted() {
                "accepted"
            } else {
                "rejected"
            },
            reason_code: outcome.code.as_str(),
            message: outcome.message,
            session_id: outcome.session_id,
            substitution: outcome.substitution,
        }
    }

    /// Serialize to the wire format.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize server message");
            r#"{"type":"error","data":{"message":"serialization failure"}}"#.to_string()
        })
    }
}

/// Parse a device message. Returns `Err` for malformed JSON or unknown
/// `type` values; callers reply with an `error` frame and continue.
pub fn parse_message(text: &str) -> Result<ClientMessage, serde_json::Error> {
    serde_json::from_str(text)
}
