//! Repository for the `schedule_slots` table.

use rollcall_core::types::DbId;
use sqlx::PgPool;

use crate::models::slot::{CreateScheduleSlot, ScheduleSlot, UpdateScheduleSlot};

const COLUMNS: &str = "id, organization_id, room, day_of_week, start_time, end_time, \
                        scheduled_teacher_id, course_code, course_name, is_active, \
                        created_at, updated_at";

/// CRUD and schedule-index queries for slot definitions.
pub struct SlotRepo;

impl SlotRepo {
    /// Insert a new slot, returning the created row.
    pub async fn create(
        pool: &PgPool,
        organization_id: DbId,
        input: &CreateScheduleSlot,
    ) -> Result<ScheduleSlot, sqlx::Error> {
        let query = format!(
            "INSERT INTO schedule_slots
                 (organization_id, room, day_of_week, start_time, end_time,
                  scheduled_teacher_id, course_code, course_name)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScheduleSlot>(&query)
            .bind(organization_id)
            .bind(&input.room)
            .bind(input.day_of_week)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.scheduled_teacher_id)
            .bind(&input.course_code)
            .bind(&input.course_name)
            .fetch_one(pool)
            .await
    }

    /// Find a slot by primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ScheduleSlot>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM schedule_slots WHERE id = $1");
        sqlx::query_as::<_, ScheduleSlot>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Apply a partial update, returning the updated row if it exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateScheduleSlot,
    ) -> Result<Option<ScheduleSlot>, sqlx::Error> {
        let query = format!(
            "UPDATE schedule_slots SET
                 room = COALESCE($2, room),
                 day_of_week = COALESCE($3, day_of_week),
                 start_time = COALESCE($4, start_time),
                 end_time = COALESCE($5, end_time),
                 scheduled_teacher_id = COALESCE($6, scheduled_teacher_id),
                 course_code = COALESCE($7, course_code),
                 course_name = COALESCE($8, course_name),
                 is_active = COALESCE($9, is_active),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScheduleSlot>(&query)
            .bind(id)
            .bind(&input.room)
            .bind(input.day_of_week)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.scheduled_teacher_id)
            .bind(&input.course_code)
            .bind(&input.course_name)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Soft-deactivate a slot. Returns `true` if the row was updated.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE schedule_slots SET is_active = false, updated_at = NOW()
             WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List slots for an organization, newest first.
    pub async fn list(
        pool: &PgPool,
        organization_id: DbId,
        include_inactive: bool,
    ) -> Result<Vec<ScheduleSlot>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM schedule_slots
             WHERE organization_id = $1 AND (is_active OR $2)
             ORDER BY room, day_of_week, start_time"
        );
        sqlx::query_as::<_, ScheduleSlot>(&query)
            .bind(organization_id)
            .bind(include_inactive)
            .fetch_all(pool)
            .await
    }

    /// Active slots for one room and weekday: the schedule-index candidate
    /// set the core matcher selects over.
    pub async fn list_for_room_day(
        pool: &PgPool,
        organization_id: DbId,
        room: &str,
        day_of_week: i16,
    ) -> Result<Vec<ScheduleSlot>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM schedule_slots
             WHERE organization_id = $1 AND room = $2 AND day_of_week = $3 AND is_active
             ORDER BY start_time"
        );
        sqlx::query_as::<_, ScheduleSlot>(&query)
            .bind(organization_id)
            .bind(room)
            .bind(day_of_week)
            .fetch_all(pool)
            .await
    }
}
