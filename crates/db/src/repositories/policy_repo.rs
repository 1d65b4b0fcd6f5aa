//! Repository for the `org_policies` table.
//!
//! Reads always reflect the latest committed write: the engine fetches
//! the row per decision with no caching layer in between.

use rollcall_core::policy::{PolicySettings, PolicyUpdate};
use rollcall_core::types::DbId;
use sqlx::PgPool;

use crate::models::policy::PolicyRow;

const COLUMNS: &str = "organization_id, early_access_window_mins, post_class_free_access_hours, \
                        operating_start_hour, operating_end_hour, teacher_grace_mins, \
                        student_first_slot_window_mins, student_regular_window_mins, \
                        student_late_after_mins, re_verification_grace_mins, break_warning_mins, \
                        points_present, points_late, created_at, updated_at";

/// Policy reads and partial-update writes.
pub struct PolicyRepo;

impl PolicyRepo {
    /// Effective policy for an organization: the stored override, or the
    /// documented defaults when none exists.
    pub async fn get(pool: &PgPool, organization_id: DbId) -> Result<PolicySettings, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM org_policies WHERE organization_id = $1");
        let row = sqlx::query_as::<_, PolicyRow>(&query)
            .bind(organization_id)
            .fetch_optional(pool)
            .await?;
        Ok(row
            .map(|r| r.settings())
            .unwrap_or_else(PolicySettings::default))
    }

    /// Merge a partial update into the current settings and persist the
    /// result, returning the new effective policy.
    pub async fn upsert(
        pool: &PgPool,
        organization_id: DbId,
        update: &PolicyUpdate,
    ) -> Result<PolicySettings, sqlx::Error> {
        let merged = Self::get(pool, organization_id).await?.merged(update);

        sqlx::query(
            "INSERT INTO org_policies
                 (organization_id, early_access_window_mins, post_class_free_access_hours,
                  operating_start_hour, operating_end_hour, teacher_grace_mins,
                  student_first_slot_window_mins, student_regular_window_mins,
                  student_late_after_mins, re_verification_grace_mins, break_warning_mins,
                  points_present, points_late)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             ON CONFLICT (organization_id) DO UPDATE SET
                 early_access_window_mins = EXCLUDED.early_access_window_mins,
                 post_class_free_access_hours = EXCLUDED.post_class_free_access_hours,
                 operating_start_hour = EXCLUDED.operating_start_hour,
                 operating_end_hour = EXCLUDED.operating_end_hour,
                 teacher_grace_mins = EXCLUDED.teacher_grace_mins,
                 student_first_slot_window_mins = EXCLUDED.student_first_slot_window_mins,
                 student_regular_window_mins = EXCLUDED.student_regular_window_mins,
                 student_late_after_mins = EXCLUDED.student_late_after_mins,
                 re_verification_grace_mins = EXCLUDED.re_verification_grace_mins,
                 break_warning_mins = EXCLUDED.break_warning_mins,
                 points_present = EXCLUDED.points_present,
                 points_late = EXCLUDED.points_late,
                 updated_at = NOW()",
        )
        .bind(organization_id)
        .bind(merged.early_access_window_mins)
        .bind(merged.post_class_free_access_hours)
        .bind(merged.operating_start_hour)
        .bind(merged.operating_end_hour)
        .bind(merged.teacher_grace_mins)
        .bind(merged.student_first_slot_window_mins)
        .bind(merged.student_regular_window_mins)
        .bind(merged.student_late_after_mins)
        .bind(merged.re_verification_grace_mins)
        .bind(merged.break_warning_mins)
        .bind(merged.points_present)
        .bind(merged.points_late)
        .execute(pool)
        .await?;

        Ok(merged)
    }
}
