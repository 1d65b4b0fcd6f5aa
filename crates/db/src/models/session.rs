//! Attendance session model.

use chrono::NaiveDate;
use rollcall_core::admission::SessionSnapshot;
use rollcall_core::session::SessionStatus;
use rollcall_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `attendance_sessions` table: one concrete occurrence of
/// a schedule slot on one calendar day.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceSession {
    pub id: DbId,
    pub organization_id: DbId,
    pub room: String,
    pub slot_id: DbId,
    pub day: NaiveDate,
    pub scheduled_teacher_id: DbId,
    pub actual_teacher_id: Option<DbId>,
    pub status: String,
    pub substitution: bool,
    pub started_at: Option<Timestamp>,
    pub last_activity_at: Timestamp,
    pub closed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AttendanceSession {
    /// Typed status, or `None` for a row with an unrecognized value.
    pub fn status(&self) -> Option<SessionStatus> {
        SessionStatus::parse(&self.status)
    }

    /// Project the fields the core decision machine looks at, with
    /// timestamps converted to the caller's wall clock via `to_wall`.
    pub fn snapshot(&self, to_wall: impl Fn(Timestamp) -> chrono::NaiveDateTime) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            status: self.status().unwrap_or(SessionStatus::Closed),
            actual_teacher_id: self.actual_teacher_id,
            started_at: self.started_at.map(&to_wall),
            last_activity_at: to_wall(self.last_activity_at),
        }
    }
}

/// Identity of one slot occurrence; the session key the engine locks on.
#[derive(Debug, Clone)]
pub struct SessionOccurrence {
    pub organization_id: DbId,
    pub room: String,
    pub slot_id: DbId,
    pub day: NaiveDate,
    pub scheduled_teacher_id: DbId,
}

/// Open session joined with its slot's nominal end time, for the sweep.
#[derive(Debug, Clone, FromRow)]
pub struct OpenSessionRow {
    pub id: DbId,
    pub organization_id: DbId,
    pub room: String,
    pub slot_id: DbId,
    pub day: NaiveDate,
    pub end_time: chrono::NaiveTime,
}
