//! The admission decision state machine.
//!
//! [`decide`] is the pure heart of the engine: given a snapshot of
//! everything the orchestrator has read (person, resolved slot, current
//! session state, policy, wall clock), it returns the decision code for
//! the device plus the side effect the orchestrator must apply. It never
//! touches I/O, so every branch is unit-testable with injected state.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::policy::PolicySettings;
use crate::schedule::SlotView;
use crate::session::SessionStatus;
use crate::types::{DbId, Role};

// ---------------------------------------------------------------------------
// Decision codes
// ---------------------------------------------------------------------------

/// Terminal decision code returned to the device for every scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionCode {
    Admitted,
    AdmittedLate,
    SessionStarted,
    Reverified,
    UnknownTag,
    NoActiveClass,
    OutsideTeacherWindow,
    TeacherNotPresent,
    NoSessionYet,
    WindowExpired,
    SessionExpired,
    SessionClosed,
    NotAuthenticated,
    TransientFailure,
}

impl DecisionCode {
    /// Wire representation, e.g. `SESSION_STARTED`.
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionCode::Admitted => "ADMITTED",
            DecisionCode::AdmittedLate => "ADMITTED_LATE",
            DecisionCode::SessionStarted => "SESSION_STARTED",
            DecisionCode::Reverified => "REVERIFIED",
            DecisionCode::UnknownTag => "UNKNOWN_TAG",
            DecisionCode::NoActiveClass => "NO_ACTIVE_CLASS",
            DecisionCode::OutsideTeacherWindow => "OUTSIDE_TEACHER_WINDOW",
            DecisionCode::TeacherNotPresent => "TEACHER_NOT_PRESENT",
            DecisionCode::NoSessionYet => "NO_SESSION_YET",
            DecisionCode::WindowExpired => "WINDOW_EXPIRED",
            DecisionCode::SessionExpired => "SESSION_EXPIRED",
            DecisionCode::SessionClosed => "SESSION_CLOSED",
            DecisionCode::NotAuthenticated => "NOT_AUTHENTICATED",
            DecisionCode::TransientFailure => "TRANSIENT_FAILURE",
        }
    }

    /// Whether the scan was accepted (as opposed to rejected).
    pub fn is_accepted(self) -> bool {
        matches!(
            self,
            DecisionCode::Admitted
                | DecisionCode::AdmittedLate
                | DecisionCode::SessionStarted
                | DecisionCode::Reverified
        )
    }

    /// Human-readable message shown on the device display.
    pub fn message(self) -> &'static str {
        match self {
            DecisionCode::Admitted => "Welcome, you are marked present",
            DecisionCode::AdmittedLate => "Admitted, marked late",
            DecisionCode::SessionStarted => "Class session started",
            DecisionCode::Reverified => "Presence re-verified",
            DecisionCode::UnknownTag => "Tag not recognized",
            DecisionCode::NoActiveClass => "No class is scheduled in this room right now",
            DecisionCode::OutsideTeacherWindow => "Too early or too late to start this class",
            DecisionCode::TeacherNotPresent => "Waiting for the teacher to arrive",
            DecisionCode::NoSessionYet => "The class session has not started yet",
            DecisionCode::WindowExpired => "The admission window for this class has passed",
            DecisionCode::SessionExpired => "This class has already ended",
            DecisionCode::SessionClosed => "This class session is closed",
            DecisionCode::NotAuthenticated => "Device is not authenticated",
            DecisionCode::TransientFailure => "Temporary failure, please scan again",
        }
    }
}

// ---------------------------------------------------------------------------
// Attendance status
// ---------------------------------------------------------------------------

/// Status recorded on an attendance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Late,
    Substituted,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Substituted => "substituted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "present" => Some(AttendanceStatus::Present),
            "late" => Some(AttendanceStatus::Late),
            "substituted" => Some(AttendanceStatus::Substituted),
            _ => None,
        }
    }

    /// Points earned for a record with this status.
    pub fn points(self, policy: &PolicySettings) -> i32 {
        match self {
            AttendanceStatus::Present | AttendanceStatus::Substituted => policy.points_present,
            AttendanceStatus::Late => policy.points_late,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot inputs
// ---------------------------------------------------------------------------

/// The session fields the decision needs, read fresh under the key lock.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub id: DbId,
    pub status: SessionStatus,
    pub actual_teacher_id: Option<DbId>,
    /// Set when the teacher opened the session; `None` while waiting.
    pub started_at: Option<NaiveDateTime>,
    pub last_activity_at: NaiveDateTime,
}

/// Everything [`decide`] looks at for one scan.
#[derive(Debug, Clone)]
pub struct ScanSnapshot<'a> {
    pub role: Role,
    pub person_id: DbId,
    pub slot: &'a SlotView,
    /// Whether `slot` is the earliest slot of the day in its room.
    pub first_slot_of_day: bool,
    pub session: Option<&'a SessionSnapshot>,
    /// Whether this person already holds an attendance record for the session.
    pub already_admitted: bool,
    pub policy: &'a PolicySettings,
    pub day: NaiveDate,
    pub now: NaiveDateTime,
}

// ---------------------------------------------------------------------------
// Decision output
// ---------------------------------------------------------------------------

/// The mutation the orchestrator must apply for a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// No state change.
    None,
    /// Create the session as ACTIVE with the scanning teacher, or promote
    /// an existing WAITING session. Emits the teacher attendance record.
    StartSession { substitution: bool },
    /// Create the session in WAITING_FOR_TEACHER (first recognized scan
    /// was a student's).
    CreateWaiting,
    /// Add the student to the session and emit their attendance record.
    AdmitStudent { status: AttendanceStatus },
    /// Teacher re-scan: refresh `last_activity_at`. `break_return` marks a
    /// re-scan past the re-verification grace, logged as a break/return.
    Reverify { break_return: bool },
    /// A second, different teacher scanned mid-session. Logged as an
    /// anomaly; the session is not mutated.
    TeacherAnomaly,
}

/// Decision code plus the effect to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub code: DecisionCode,
    pub effect: Effect,
}

impl Decision {
    /// A rejection with no side effect.
    pub fn reject(code: DecisionCode) -> Self {
        Self {
            code,
            effect: Effect::None,
        }
    }
}

// ---------------------------------------------------------------------------
// The state machine
// ---------------------------------------------------------------------------

/// Decide the outcome of one scan against a resolved slot.
///
/// The caller has already handled `UNKNOWN_TAG` (directory miss) and
/// `NO_ACTIVE_CLASS` (no slot window contains `now`); everything else in
/// the admission algorithm lives here.
pub fn decide(scan: &ScanSnapshot<'_>) -> Decision {
    match (scan.session, scan.role) {
        (None, Role::Teacher) => teacher_open(scan),
        (None, Role::Student) => {
            // A student cannot open a session, but the first recognized
            // scan still materializes the occurrence as WAITING so later
            // students see TEACHER_NOT_PRESENT. Past slot end there is
            // nothing left to wait for.
            if scan.now > scan.slot.ends_at(scan.day) {
                Decision::reject(DecisionCode::NoSessionYet)
            } else {
                Decision {
                    code: DecisionCode::NoSessionYet,
                    effect: Effect::CreateWaiting,
                }
            }
        }
        (Some(session), role) => match session.status {
            SessionStatus::Closed => Decision::reject(DecisionCode::SessionClosed),
            SessionStatus::WaitingForTeacher => match role {
                Role::Teacher => teacher_open(scan),
                Role::Student => Decision::reject(DecisionCode::TeacherNotPresent),
            },
            SessionStatus::Active => match role {
                Role::Teacher => teacher_rescan(scan, session),
                Role::Student => student_admission(scan, session),
            },
        },
    }
}

/// Teacher starting (or taking over a WAITING) session: accepted within
/// `[slot.start − teacher_grace_mins, slot.end]`.
fn teacher_open(scan: &ScanSnapshot<'_>) -> Decision {
    let open = scan.slot.starts_at(scan.day)
        - chrono::Duration::minutes(scan.policy.teacher_grace_mins as i64);
    let close = scan.slot.ends_at(scan.day);

    if scan.now < open || scan.now > close {
        return Decision::reject(DecisionCode::OutsideTeacherWindow);
    }

    Decision {
        code: DecisionCode::SessionStarted,
        effect: Effect::StartSession {
            substitution: scan.person_id != scan.slot.scheduled_teacher_id,
        },
    }
}

/// Repeat scan by a teacher on an ACTIVE session.
///
/// The admitted teacher re-verifies (or returns from a break); a
/// different teacher is an anomaly that never mutates the session.
fn teacher_rescan(scan: &ScanSnapshot<'_>, session: &SessionSnapshot) -> Decision {
    if session.actual_teacher_id != Some(scan.person_id) {
        return Decision {
            code: DecisionCode::Reverified,
            effect: Effect::TeacherAnomaly,
        };
    }

    let idle = scan.now - session.last_activity_at;
    let grace = chrono::Duration::minutes(scan.policy.re_verification_grace_mins as i64);
    Decision {
        code: DecisionCode::Reverified,
        effect: Effect::Reverify {
            break_return: idle > grace,
        },
    }
}

/// Student scanning into an ACTIVE session.
fn student_admission(scan: &ScanSnapshot<'_>, session: &SessionSnapshot) -> Decision {
    if scan.already_admitted {
        // Re-scan is a no-op success: same decision, no second record.
        return Decision {
            code: DecisionCode::Admitted,
            effect: Effect::None,
        };
    }

    if scan.now > scan.slot.ends_at(scan.day) {
        return Decision::reject(DecisionCode::SessionExpired);
    }

    // Admission windows are measured from the moment the teacher opened
    // the session, not from the nominal slot start.
    let Some(started_at) = session.started_at else {
        return Decision::reject(DecisionCode::TeacherNotPresent);
    };
    let elapsed = scan.now - started_at;

    let window_mins = if scan.first_slot_of_day {
        scan.policy.student_first_slot_window_mins
    } else {
        scan.policy.student_regular_window_mins
    };
    if elapsed > chrono::Duration::minutes(window_mins as i64) {
        return Decision::reject(DecisionCode::WindowExpired);
    }

    let late = elapsed > chrono::Duration::minutes(scan.policy.student_late_after_mins as i64);
    let (code, status) = if late {
        (DecisionCode::AdmittedLate, AttendanceStatus::Late)
    } else {
        (DecisionCode::Admitted, AttendanceStatus::Present)
    };
    Decision {
        code,
        effect: Effect::AdmitStudent { status },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
