//! Room device model and DTOs.

use rollcall_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `devices` table. The key itself is never stored, only
/// its SHA-256 hex digest.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Device {
    pub id: DbId,
    pub organization_id: DbId,
    pub room: String,
    pub label: String,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub is_active: bool,
    pub last_seen_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering a new device.
#[derive(Debug, Deserialize)]
pub struct CreateDevice {
    pub room: String,
    pub label: String,
}
