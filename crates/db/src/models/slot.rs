//! Schedule slot model and DTOs.

use chrono::NaiveTime;
use rollcall_core::schedule::SlotView;
use rollcall_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `schedule_slots` table: one recurring weekly class.
///
/// `day_of_week` counts from Monday (0) through Sunday (6).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScheduleSlot {
    pub id: DbId,
    pub organization_id: DbId,
    pub room: String,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub scheduled_teacher_id: DbId,
    pub course_code: String,
    pub course_name: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ScheduleSlot {
    /// Project the schedule fields the core matcher operates on.
    pub fn view(&self) -> SlotView {
        SlotView {
            id: self.id,
            scheduled_teacher_id: self.scheduled_teacher_id,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// DTO for creating a new schedule slot.
#[derive(Debug, Deserialize)]
pub struct CreateScheduleSlot {
    pub room: String,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub scheduled_teacher_id: DbId,
    pub course_code: String,
    pub course_name: String,
}

/// DTO for updating a schedule slot. All fields optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateScheduleSlot {
    pub room: Option<String>,
    pub day_of_week: Option<i16>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub scheduled_teacher_id: Option<DbId>,
    pub course_code: Option<String>,
    pub course_name: Option<String>,
    pub is_active: Option<bool>,
}
