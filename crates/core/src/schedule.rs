//! Schedule-slot matching: which recurring slot, if any, is authorized in
//! a room at a given wall-clock instant.
//!
//! Candidate slots for the room and weekday are fetched by the caller;
//! selection over them is pure so the tie-break can be tested exhaustively.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::policy::PolicySettings;
use crate::types::DbId;

/// The schedule fields the matcher needs from a slot definition row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotView {
    pub id: DbId,
    pub scheduled_teacher_id: DbId,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl SlotView {
    /// Nominal class start on the given day.
    pub fn starts_at(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(self.start_time)
    }

    /// Nominal class end on the given day.
    pub fn ends_at(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(self.end_time)
    }

    /// The full access window on the given day:
    /// `[start − early_access_window_mins, end + post_class_free_access_hours]`.
    ///
    /// The tail may extend past midnight; `NaiveDateTime` arithmetic keeps
    /// that well-defined.
    pub fn access_window(
        &self,
        day: NaiveDate,
        policy: &PolicySettings,
    ) -> (NaiveDateTime, NaiveDateTime) {
        let open =
            self.starts_at(day) - chrono::Duration::minutes(policy.early_access_window_mins as i64);
        let close = self.ends_at(day)
            + chrono::Duration::hours(policy.post_class_free_access_hours as i64);
        (open, close)
    }

    /// Whether `now` falls inside the access window (both ends inclusive).
    pub fn covers(&self, day: NaiveDate, now: NaiveDateTime, policy: &PolicySettings) -> bool {
        let (open, close) = self.access_window(day, policy);
        now >= open && now <= close
    }

    /// Nominal slot duration, used as the tie-break's second key.
    fn nominal_duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }
}

/// Select the active slot for `now` among the candidates, or `None` when
/// no access window contains it.
///
/// Overlapping active slots for one room are a configuration error the
/// engine tolerates deterministically: the earliest-starting slot wins,
/// and among equal starts the narrower nominal interval wins. Callers can
/// detect the anomaly via [`matching_count`].
pub fn find_active_slot<'a>(
    slots: &'a [SlotView],
    day: NaiveDate,
    now: NaiveDateTime,
    policy: &PolicySettings,
) -> Option<&'a SlotView> {
    slots
        .iter()
        .filter(|slot| slot.covers(day, now, policy))
        .min_by_key(|slot| (slot.start_time, slot.nominal_duration()))
}

/// Number of candidates whose access window contains `now`. A value above
/// one indicates overlapping active slot definitions.
pub fn matching_count(
    slots: &[SlotView],
    day: NaiveDate,
    now: NaiveDateTime,
    policy: &PolicySettings,
) -> usize {
    slots
        .iter()
        .filter(|slot| slot.covers(day, now, policy))
        .count()
}

/// Whether `slot` is the first scheduled slot of the day among the
/// candidates for its room and weekday, which widens the student
/// admission window.
pub fn is_first_slot_of_day(slot: &SlotView, slots: &[SlotView]) -> bool {
    slots
        .iter()
        .map(|s| s.start_time)
        .min()
        .is_some_and(|earliest| slot.start_time == earliest)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
