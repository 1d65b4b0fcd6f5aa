//! Organization policy settings: the tunable time-window parameters that
//! govern every admission decision.
//!
//! A [`PolicySettings`] value is always handled as an explicit snapshot:
//! the engine fetches one per decision and threads it through the pure
//! decision functions, so tests can inject arbitrary values.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// How early (minutes before slot start) a slot becomes resolvable at all.
pub const DEFAULT_EARLY_ACCESS_WINDOW_MINS: i32 = 60;

/// How long (hours after slot end) a slot keeps resolving for late scans.
pub const DEFAULT_POST_CLASS_FREE_ACCESS_HOURS: i32 = 1;

/// First hour of the operating day (inclusive).
pub const DEFAULT_OPERATING_START_HOUR: i32 = 7;

/// First hour after the operating day (exclusive).
pub const DEFAULT_OPERATING_END_HOUR: i32 = 22;

/// Minutes before slot start from which a teacher may open the session.
pub const DEFAULT_TEACHER_GRACE_MINS: i32 = 15;

/// Student admission window for the first slot of the day, from session start.
pub const DEFAULT_STUDENT_FIRST_SLOT_WINDOW_MINS: i32 = 30;

/// Student admission window for all other slots, from session start.
pub const DEFAULT_STUDENT_REGULAR_WINDOW_MINS: i32 = 15;

/// Admissions later than this many minutes after session start are `late`.
pub const DEFAULT_STUDENT_LATE_AFTER_MINS: i32 = 10;

/// A teacher re-scan within this many minutes of the last activity is a
/// plain re-verification; later re-scans are logged as break/return.
pub const DEFAULT_RE_VERIFICATION_GRACE_MINS: i32 = 10;

/// Grace past slot end before the sweep closes an idle session.
pub const DEFAULT_BREAK_WARNING_MINS: i32 = 15;

/// Points earned for an on-time admission.
pub const DEFAULT_POINTS_PRESENT: i32 = 10;

/// Points earned for a late admission.
pub const DEFAULT_POINTS_LATE: i32 = 5;

// ---------------------------------------------------------------------------
// PolicySettings
// ---------------------------------------------------------------------------

/// Per-organization policy snapshot.
///
/// When an organization has no stored override, [`PolicySettings::default`]
/// applies. All minute/hour values are wall-clock quantities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySettings {
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
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            early_access_window_mins: DEFAULT_EARLY_ACCESS_WINDOW_MINS,
            post_class_free_access_hours: DEFAULT_POST_CLASS_FREE_ACCESS_HOURS,
            operating_start_hour: DEFAULT_OPERATING_START_HOUR,
            operating_end_hour: DEFAULT_OPERATING_END_HOUR,
            teacher_grace_mins: DEFAULT_TEACHER_GRACE_MINS,
            student_first_slot_window_mins: DEFAULT_STUDENT_FIRST_SLOT_WINDOW_MINS,
            student_regular_window_mins: DEFAULT_STUDENT_REGULAR_WINDOW_MINS,
            student_late_after_mins: DEFAULT_STUDENT_LATE_AFTER_MINS,
            re_verification_grace_mins: DEFAULT_RE_VERIFICATION_GRACE_MINS,
            break_warning_mins: DEFAULT_BREAK_WARNING_MINS,
            points_present: DEFAULT_POINTS_PRESENT,
            points_late: DEFAULT_POINTS_LATE,
        }
    }
}

/// Partial policy update. Every field is optional; `None` leaves the
/// current value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyUpdate {
    pub early_access_window_mins: Option<i32>,
    pub post_class_free_access_hours: Option<i32>,
    pub operating_start_hour: Option<i32>,
    pub operating_end_hour: Option<i32>,
    pub teacher_grace_mins: Option<i32>,
    pub student_first_slot_window_mins: Option<i32>,
    pub student_regular_window_mins: Option<i32>,
    pub student_late_after_mins: Option<i32>,
    pub re_verification_grace_mins: Option<i32>,
    pub break_warning_mins: Option<i32>,
    pub points_present: Option<i32>,
    pub points_late: Option<i32>,
}

impl PolicySettings {
    /// Apply a partial update, returning the merged settings.
    pub fn merged(&self, update: &PolicyUpdate) -> Self {
        Self {
            early_access_window_mins: update
                .early_access_window_mins
                .unwrap_or(self.early_access_window_mins),
            post_class_free_access_hours: update
                .post_class_free_access_hours
                .unwrap_or(self.post_class_free_access_hours),
            operating_start_hour: update
                .operating_start_hour
                .unwrap_or(self.operating_start_hour),
            operating_end_hour: update.operating_end_hour.unwrap_or(self.operating_end_hour),
            teacher_grace_mins: update.teacher_grace_mins.unwrap_or(self.teacher_grace_mins),
            student_first_slot_window_mins: update
                .student_first_slot_window_mins
                .unwrap_or(self.student_first_slot_window_mins),
            student_regular_window_mins: update
                .student_regular_window_mins
                .unwrap_or(self.student_regular_window_mins),
            student_late_after_mins: update
                .student_late_after_mins
                .unwrap_or(self.student_late_after_mins),
            re_verification_grace_mins: update
                .re_verification_grace_mins
                .unwrap_or(self.re_verification_grace_mins),
            break_warning_mins: update.break_warning_mins.unwrap_or(self.break_warning_mins),
            points_present: update.points_present.unwrap_or(self.points_present),
            points_late: update.points_late.unwrap_or(self.points_late),
        }
    }

    /// Validate the settings. Operating hours must describe a non-empty
    /// interval inside a single day; all windows must be non-negative.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(0..=23).contains(&self.operating_start_hour)
            || !(1..=24).contains(&self.operating_end_hour)
        {
            return Err(CoreError::Validation(
                "operating hours must be within 0..=23 (start) and 1..=24 (end)".to_string(),
            ));
        }
        if self.operating_start_hour >= self.operating_end_hour {
            return Err(CoreError::Validation(
                "operating_start_hour must be before operating_end_hour".to_string(),
            ));
        }

        let windows = [
            ("early_access_window_mins", self.early_access_window_mins),
            (
                "post_class_free_access_hours",
                self.post_class_free_access_hours,
            ),
            ("teacher_grace_mins", self.teacher_grace_mins),
            (
                "student_first_slot_window_mins",
                self.student_first_slot_window_mins,
            ),
            (
                "student_regular_window_mins",
                self.student_regular_window_mins,
            ),
            ("student_late_after_mins", self.student_late_after_mins),
            (
                "re_verification_grace_mins",
                self.re_verification_grace_mins,
            ),
            ("break_warning_mins", self.break_warning_mins),
        ];
        for (name, value) in windows {
            if value < 0 {
                return Err(CoreError::Validation(format!("{name} must be >= 0")));
            }
        }

        if self.points_present < 0 || self.points_late < 0 {
            return Err(CoreError::Validation(
                "points values must be >= 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether `hour` falls inside the operating day.
    ///
    /// The start hour is inclusive, the end hour exclusive, so the default
    /// 7..22 accepts scans from 07:00:00 up to 21:59:59.
    pub fn within_operating_hours(&self, hour: u32) -> bool {
        (hour as i32) >= self.operating_start_hour && (hour as i32) < self.operating_end_hour
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
