//! Repository for the `attendance_sessions` table.
//!
//! Session mutations that also emit an attendance record run inside a
//! single transaction so no error path can commit a partial admission.
//! Callers serialize per-occurrence access through the engine's key
//! locks; the `uq_attendance_sessions_occurrence` constraint is the
//! durable backstop.

use chrono::NaiveDate;
use rollcall_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::session::{AttendanceSession, OpenSessionRow, SessionOccurrence};

const COLUMNS: &str = "id, organization_id, room, slot_id, day, scheduled_teacher_id, \
                        actual_teacher_id, status, substitution, started_at, last_activity_at, \
                        closed_at, created_at, updated_at";

/// Session lifecycle persistence.
pub struct SessionRepo;

impl SessionRepo {
    /// Find the session for one slot occurrence, whatever its status.
    ///
    /// At most one row can exist per occurrence.
    pub async fn find_by_occurrence(
        pool: &PgPool,
        organization_id: DbId,
        room: &str,
        slot_id: DbId,
        day: NaiveDate,
    ) -> Result<Option<AttendanceSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM attendance_sessions
             WHERE organization_id = $1 AND room = $2 AND slot_id = $3 AND day = $4"
        );
        sqlx::query_as::<_, AttendanceSession>(&query)
            .bind(organization_id)
            .bind(room)
            .bind(slot_id)
            .bind(day)
            .fetch_optional(pool)
            .await
    }

    /// Find a session by primary key.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<AttendanceSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM attendance_sessions WHERE id = $1");
        sqlx::query_as::<_, AttendanceSession>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create the occurrence's session in WAITING_FOR_TEACHER.
    pub async fn create_waiting(
        pool: &PgPool,
        occurrence: &SessionOccurrence,
        now: Timestamp,
    ) -> Result<AttendanceSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO attendance_sessions
                 (organization_id, room, slot_id, day, scheduled_teacher_id,
                  status, last_activity_at)
             VALUES ($1, $2, $3, $4, $5, 'waiting_for_teacher', $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AttendanceSession>(&query)
            .bind(occurrence.organization_id)
            .bind(&occurrence.room)
            .bind(occurrence.slot_id)
            .bind(occurrence.day)
            .bind(occurrence.scheduled_teacher_id)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Open the session as ACTIVE with the scanning teacher and emit the
    /// teacher's attendance record, atomically.
    ///
    /// Promotes the occurrence's WAITING row when `existing_id` is set,
    /// otherwise inserts a fresh ACTIVE row.
    #[allow(clippy::too_many_arguments)]
    pub async fn start(
        pool: &PgPool,
        occurrence: &SessionOccurrence,
        existing_id: Option<DbId>,
        teacher_id: DbId,
        substitution: bool,
        record_status: &str,
        points: i32,
        now: Timestamp,
    ) -> Result<AttendanceSession, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let session = match existing_id {
            Some(id) => {
                let query = format!(
                    "UPDATE attendance_sessions SET
                         status = 'active',
                         actual_teacher_id = $2,
                         substitution = $3,
                         started_at = $4,
                         last_activity_at = $4,
                         updated_at = NOW()
                     WHERE id = $1 AND status = 'waiting_for_teacher'
                     RETURNING {COLUMNS}"
                );
                sqlx::query_as::<_, AttendanceSession>(&query)
                    .bind(id)
                    .bind(teacher_id)
                    .bind(substitution)
                    .bind(now)
                    .fetch_one(&mut *tx)
                    .await?
            }
            None => {
                let query = format!(
                    "INSERT INTO attendance_sessions
                         (organization_id, room, slot_id, day, scheduled_teacher_id,
                          actual_teacher_id, status, substitution, started_at,
                          last_activity_at)
                     VALUES ($1, $2, $3, $4, $5, $6, 'active', $7, $8, $8)
                     RETURNING {COLUMNS}"
                );
                sqlx::query_as::<_, AttendanceSession>(&query)
                    .bind(occurrence.organization_id)
                    .bind(&occurrence.room)
                    .bind(occurrence.slot_id)
                    .bind(occurrence.day)
                    .bind(occurrence.scheduled_teacher_id)
                    .bind(teacher_id)
                    .bind(substitution)
                    .bind(now)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        sqlx::query(
            "INSERT INTO attendance_records
                 (session_id, person_id, role_at_scan, status, points_earned, recorded_at)
             VALUES ($1, $2, 'teacher', $3, $4, $5)",
        )
        .bind(session.id)
        .bind(teacher_id)
        .bind(record_status)
        .bind(points)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(session)
    }

    /// Admit a student: insert their attendance record and refresh the
    /// session's activity timestamp, atomically.
    pub async fn admit_student(
        pool: &PgPool,
        session_id: DbId,
        person_id: DbId,
        record_status: &str,
        points: i32,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT INTO attendance_records
                 (session_id, person_id, role_at_scan, status, points_earned, recorded_at)
             VALUES ($1, $2, 'student', $3, $4, $5)",
        )
        .bind(session_id)
        .bind(person_id)
        .bind(record_status)
        .bind(points)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE attendance_sessions SET last_activity_at = $2, updated_at = NOW()
             WHERE id = $1 AND status = 'active'",
        )
        .bind(session_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Refresh the activity timestamp on a teacher re-verification.
    pub async fn touch_activity(
        pool: &PgPool,
        session_id: DbId,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE attendance_sessions SET last_activity_at = $2, updated_at = NOW()
             WHERE id = $1 AND status = 'active'",
        )
        .bind(session_id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Close a session. Returns `true` if the row transitioned; `false`
    /// when it was already closed (or does not exist).
    pub async fn close(pool: &PgPool, session_id: DbId, now: Timestamp) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE attendance_sessions SET
                 status = 'closed', closed_at = $2, updated_at = NOW()
             WHERE id = $1 AND status <> 'closed'",
        )
        .bind(session_id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All non-closed sessions joined with their slot's nominal end time,
    /// for the background sweep.
    pub async fn list_open(pool: &PgPool) -> Result<Vec<OpenSessionRow>, sqlx::Error> {
        sqlx::query_as::<_, OpenSessionRow>(
            "SELECT s.id, s.organization_id, s.room, s.slot_id, s.day, sl.end_time
             FROM attendance_sessions s
             JOIN schedule_slots sl ON sl.id = s.slot_id
             WHERE s.status <> 'closed'
             ORDER BY s.id",
        )
        .fetch_all(pool)
        .await
    }

    /// List sessions for dashboards, newest first, with optional room and
    /// day filters.
    pub async fn list(
        pool: &PgPool,
        organization_id: DbId,
        room: Option<&str>,
        day: Option<NaiveDate>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AttendanceSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM attendance_sessions
             WHERE organization_id = $1
               AND ($2::text IS NULL OR room = $2)
               AND ($3::date IS NULL OR day = $3)
             ORDER BY day DESC, created_at DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, AttendanceSession>(&query)
            .bind(organization_id)
            .bind(room)
            .bind(day)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// The open session in a room on the given day, if any: the live
    /// dashboard view.
    pub async fn find_open_for_room(
        pool: &PgPool,
        organization_id: DbId,
        room: &str,
        day: NaiveDate,
    ) -> Result<Option<AttendanceSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM attendance_sessions
             WHERE organization_id = $1 AND room = $2 AND day = $3 AND status <> 'closed'
             ORDER BY created_at DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, AttendanceSession>(&query)
            .bind(organization_id)
            .bind(room)
            .bind(day)
            .fetch_optional(pool)
            .await
    }
}
