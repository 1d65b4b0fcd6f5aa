//! The admission engine orchestrator.
//!
//! Wires the pure decision core to the stores: directory lookup, policy
//! read, schedule-index query, then the locked session transition. The
//! external reads run without any lock held; the per-occurrence lock is
//! taken only for the re-read + decide + mutate step, so slow I/O never
//! serializes unrelated rooms.

pub mod locks;

use chrono::{Datelike, Timelike};
use serde::Serialize;

use rollcall_core::admission::{
    self, AttendanceStatus, Decision, DecisionCode, Effect, ScanSnapshot,
};
use rollcall_core::schedule::{self, SlotView};
use rollcall_core::session::SessionStatus;
use rollcall_core::types::{DbId, Role, Timestamp};
use rollcall_db::models::session::SessionOccurrence;
use rollcall_db::repositories::{AttendanceRepo, PersonRepo, PolicyRepo, SessionRepo, SlotRepo};
use rollcall_events::DomainEvent;

use crate::state::AppState;
use locks::SessionKey;

/// The room binding established by a device's handshake.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    pub device_id: DbId,
    pub organization_id: DbId,
    pub room: String,
}

/// Terminal result of one scan, relayed verbatim to the device.
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub code: DecisionCode,
    pub message: String,
    pub session_id: Option<DbId>,
    pub substitution: Option<bool>,
}

impl ScanOutcome {
    /// An outcome with no session attached and the code's stock message.
    pub fn bare(code: DecisionCode) -> Self {
        Self {
            code,
            message: code.message().to_string(),
            session_id: None,
            substitution: None,
        }
    }
}

/// Process one scan event from an authenticated device.
///
/// Always returns exactly one terminal outcome; infrastructure failures
/// surface as `TRANSIENT_FAILURE` with no partial session mutation.
pub async fn process_scan(
    state: &AppState,
    device: &DeviceIdentity,
    rfid_tag: &str,
    now: Timestamp,
) -> ScanOutcome {
    match try_process_scan(state, device, rfid_tag, now).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(
                error = %e,
                room = %device.room,
                "Scan processing failed, returning transient failure"
            );
            ScanOutcome::bare(DecisionCode::TransientFailure)
        }
    }
}

async fn try_process_scan(
    state: &AppState,
    device: &DeviceIdentity,
    rfid_tag: &str,
    now: Timestamp,
) -> Result<ScanOutcome, sqlx::Error> {
    let org = device.organization_id;
    let wall = state.config.to_wall(now);
    let day = wall.date();

    // Policy snapshot for this decision. Read fresh every time so admin
    // changes take effect for in-flight sessions without restart.
    let policy = PolicyRepo::get(&state.pool, org).await?;

    // Directory lookup. A miss is a normal rejection, not a fault.
    let Some(person) = PersonRepo::find_by_tag(&state.pool, org, rfid_tag).await? else {
        return Ok(ScanOutcome::bare(DecisionCode::UnknownTag));
    };
    let Some(role) = person.role() else {
        tracing::warn!(person_id = person.id, role = %person.role, "Unrecognized directory role");
        return Ok(ScanOutcome::bare(DecisionCode::UnknownTag));
    };

    // Outside the operating day nothing is schedulable, so the schedule
    // lookup is skipped entirely.
    if !policy.within_operating_hours(wall.hour()) {
        return Ok(ScanOutcome::bare(DecisionCode::NoActiveClass));
    }

    // Schedule index: candidates for this room and weekday, selected over
    // in core.
    let weekday = day.weekday().num_days_from_monday() as i16;
    let slots = SlotRepo::list_for_room_day(&state.pool, org, &device.room, weekday).await?;
    let views: Vec<SlotView> = slots.iter().map(|s| s.view()).collect();

    let Some(slot_view) = schedule::find_active_slot(&views, day, wall, &policy) else {
        return Ok(ScanOutcome::bare(DecisionCode::NoActiveClass));
    };
    let overlapping = schedule::matching_count(&views, day, wall, &policy);
    if overlapping > 1 {
        tracing::debug!(
            room = %device.room,
            slot_id = slot_view.id,
            overlapping,
            "Overlapping active slots, earliest-starting selected"
        );
    }
    let first_slot_of_day = schedule::is_first_slot_of_day(slot_view, &views);
    let slot_view = slot_view.clone();

    let occurrence = SessionOccurrence {
        organization_id: org,
        room: device.room.clone(),
        slot_id: slot_view.id,
        day,
        scheduled_teacher_id: slot_view.scheduled_teacher_id,
    };

    // All external reads are done; take the occurrence lock for the
    // in-memory transition and re-read the session to guard against a
    // concurrent scan having changed it.
    let key = SessionKey {
        organization_id: org,
        room: device.room.clone(),
        slot_id: slot_view.id,
        day,
    };
    let lock = state.session_locks.lock_for(&key).await;
    let _guard = lock.lock().await;

    let session_row =
        SessionRepo::find_by_occurrence(&state.pool, org, &device.room, slot_view.id, day).await?;
    let snapshot = session_row
        .as_ref()
        .map(|s| s.snapshot(|t| state.config.to_wall(t)));

    let already_admitted = match (&snapshot, role) {
        (Some(s), Role::Student) if s.status == SessionStatus::Active => {
            AttendanceRepo::exists(&state.pool, s.id, person.id).await?
        }
        _ => false,
    };

    let decision = admission::decide(&ScanSnapshot {
        role,
        person_id: person.id,
        slot: &slot_view,
        first_slot_of_day,
        session: snapshot.as_ref(),
        already_admitted,
        policy: &policy,
        day,
        now: wall,
    });

    apply_decision(
        state,
        decision,
        &occurrence,
        session_row.as_ref().map(|s| s.id),
        person.id,
        &policy,
        now,
    )
    .await
}

/// Apply a decision's effect and build the outcome.
///
/// Each effect commits in a single repository transaction; events are
/// published only after the commit succeeded.
async fn apply_decision(
    state: &AppState,
    decision: Decision,
    occurrence: &SessionOccurrence,
    existing_session_id: Option<DbId>,
    person_id: DbId,
    policy: &rollcall_core::policy::PolicySettings,
    now: Timestamp,
) -> Result<ScanOutcome, sqlx::Error> {
    let room = occurrence.room.as_str();

    match decision.effect {
        Effect::None => {
            let mut outcome = ScanOutcome::bare(decision.code);
            outcome.session_id = existing_session_id.filter(|_| decision.code.is_accepted());
            Ok(outcome)
        }

        Effect::StartSession { substitution } => {
            let record_status = if substitution {
                AttendanceStatus::Substituted
            } else {
                AttendanceStatus::Present
            };
            let session = SessionRepo::start(
                &state.pool,
                occurrence,
                existing_session_id,
                person_id,
                substitution,
                record_status.as_str(),
                record_status.points(policy),
                now,
            )
            .await?;

            tracing::info!(
                session_id = session.id,
                room,
                teacher_id = person_id,
                substitution,
                "Session started"
            );
            state.event_bus.publish(
                DomainEvent::new("session.started")
                    .with_room(room)
                    .with_session(session.id)
                    .with_person(person_id)
                    .with_payload(serde_json::json!({
                        "substitution": substitution,
                        "scheduled_teacher_id": occurrence.scheduled_teacher_id,
                    })),
            );

            Ok(ScanOutcome {
                code: decision.code,
                message: decision.code.message().to_string(),
                session_id: Some(session.id),
                substitution: Some(substitution),
            })
        }

        Effect::CreateWaiting => {
            let session = SessionRepo::create_waiting(&state.pool, occurrence, now).await?;

            tracing::info!(session_id = session.id, room, "Session waiting for teacher");
            state.event_bus.publish(
                DomainEvent::new("session.waiting_created")
                    .with_room(room)
                    .with_session(session.id)
                    .with_person(person_id),
            );

            Ok(ScanOutcome::bare(decision.code))
        }

        Effect::AdmitStudent { status } => {
            let Some(session_id) = existing_session_id else {
                tracing::error!(room, "Admit effect without a session row");
                return Ok(ScanOutcome::bare(DecisionCode::TransientFailure));
            };
            let admit = SessionRepo::admit_student(
                &state.pool,
                session_id,
                person_id,
                status.as_str(),
                status.points(policy),
                now,
            )
            .await;

            if let Err(e) = admit {
                // A rapid double-tap can slip past the exists() probe only
                // across processes; the unique constraint keeps the record
                // single and the scan stays an idempotent success.
                if is_unique_violation(&e) {
                    tracing::debug!(session_id, person_id, "Duplicate admission suppressed");
                    return Ok(ScanOutcome {
                        code: DecisionCode::Admitted,
                        message: DecisionCode::Admitted.message().to_string(),
                        session_id: Some(session_id),
                        substitution: None,
                    });
                }
                return Err(e);
            }

            tracing::info!(session_id, student_id = person_id, status = status.as_str(), "Student admitted");
            state.event_bus.publish(
                DomainEvent::new("student.admitted")
                    .with_room(room)
                    .with_session(session_id)
                    .with_person(person_id)
                    .with_payload(serde_json::json!({ "status": status.as_str() })),
            );

            Ok(ScanOutcome {
                code: decision.code,
                message: decision.code.message().to_string(),
                session_id: Some(session_id),
                substitution: None,
            })
        }

        Effect::Reverify { break_return } => {
            let Some(session_id) = existing_session_id else {
                tracing::error!(room, "Reverify effect without a session row");
                return Ok(ScanOutcome::bare(DecisionCode::TransientFailure));
            };
            SessionRepo::touch_activity(&state.pool, session_id, now).await?;

            let event_type = if break_return {
                "teacher.break_return"
            } else {
                "teacher.reverified"
            };
            tracing::debug!(session_id, teacher_id = person_id, break_return, "Teacher re-verified");
            state.event_bus.publish(
                DomainEvent::new(event_type)
                    .with_room(room)
                    .with_session(session_id)
                    .with_person(person_id),
            );

            Ok(ScanOutcome {
                code: decision.code,
                message: decision.code.message().to_string(),
                session_id: Some(session_id),
                substitution: None,
            })
        }

        Effect::TeacherAnomaly => {
            let Some(session_id) = existing_session_id else {
                tracing::error!(room, "Anomaly effect without a session row");
                return Ok(ScanOutcome::bare(DecisionCode::TransientFailure));
            };
            tracing::warn!(
                session_id,
                scanned_teacher_id = person_id,
                "Second distinct teacher scanned mid-session"
            );
            state.event_bus.publish(
                DomainEvent::new("session.teacher_anomaly")
                    .with_room(room)
                    .with_session(session_id)
                    .with_person(person_id),
            );

            Ok(ScanOutcome {
                code: decision.code,
                message: "Another teacher is already running this session".to_string(),
                session_id: Some(session_id),
                substitution: None,
            })
        }
    }
}

/// Whether a sqlx error is a Postgres unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505")
    )
}
