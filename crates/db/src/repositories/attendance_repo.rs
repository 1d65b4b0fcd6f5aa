//! Read-side repository for the `attendance_records` table.
//!
//! Records are written by [`SessionRepo`](crate::repositories::SessionRepo)
//! inside session transactions; this repository only answers the
//! idempotence probe and the export/reporting reads.

use rollcall_core::types::DbId;
use sqlx::PgPool;

use crate::models::attendance::AttendanceRecord;

const COLUMNS: &str = "id, session_id, person_id, role_at_scan, status, points_earned, recorded_at";

/// Attendance record queries.
pub struct AttendanceRepo;

impl AttendanceRepo {
    /// Whether a person already holds a record for the session.
    pub async fn exists(
        pool: &PgPool,
        session_id: DbId,
        person_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                 SELECT 1 FROM attendance_records
                 WHERE session_id = $1 AND person_id = $2
             )",
        )
        .bind(session_id)
        .bind(person_id)
        .fetch_one(pool)
        .await
    }

    /// All records for a session in scan order: the export feed.
    pub async fn list_for_session(
        pool: &PgPool,
        session_id: DbId,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM attendance_records
             WHERE session_id = $1
             ORDER BY recorded_at, id"
        );
        sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(session_id)
            .fetch_all(pool)
            .await
    }
}
