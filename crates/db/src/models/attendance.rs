//! Attendance record model.
//!
//! Records are immutable facts emitted once per successful admission;
//! there are no update DTOs, and nothing in this service reads them back
//! for decisions (downstream reporting does).

use rollcall_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `attendance_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceRecord {
    pub id: DbId,
    pub session_id: DbId,
    pub person_id: DbId,
    pub role_at_scan: String,
    pub status: String,
    pub points_earned: i32,
    pub recorded_at: Timestamp,
}
