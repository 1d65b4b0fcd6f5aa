//! Audit event model.

use rollcall_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub event_type: String,
    pub room: Option<String>,
    pub session_id: Option<DbId>,
    pub person_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
}
