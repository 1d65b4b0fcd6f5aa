//! Organization policy row mapping.

use rollcall_core::policy::PolicySettings;
use rollcall_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `org_policies` table.
///
/// The row exists only for organizations that have overridden at least
/// one default; [`PolicyRow::settings`] converts to the core snapshot.
#[derive(Debug, Clone, FromRow)]
pub struct PolicyRow {
    pub organization_id: DbId,
    pub early_access_window_mins: i32,
    pub post_class_free_access_hours: i32,
    pub operating_start_hour: i32,
    pub operating_end_hour: i32,
    pub teacher_grace_mins: i32,
    pub student_first_slot_window_mins: i32,
    pub student_regular_window_mins: i32,
    pub student_late_after_mins: i32,
    pub re_verification_grace_mins: i32,
    pub break_warning_mins: i32,
    pub points_present: i32,
    pub points_late: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PolicyRow {
    /// Convert to the core policy snapshot.
    pub fn settings(&self) -> PolicySettings {
        PolicySettings {
            early_access_window_mins: self.early_access_window_mins,
            post_class_free_access_hours: self.post_class_free_access_hours,
            operating_start_hour: self.operating_start_hour,
            operating_end_hour: self.operating_end_hour,
            teacher_grace_mins: self.teacher_grace_mins,
            student_first_slot_window_mins: self.student_first_slot_window_mins,
            student_regular_window_mins: self.student_regular_window_mins,
            student_late_after_mins: self.student_late_after_mins,
            re_verification_grace_mins: self.re_verification_grace_mins,
            break_warning_mins: self.break_warning_mins,
            points_present: self.points_present,
            points_late: self.points_late,
        }
    }
}
