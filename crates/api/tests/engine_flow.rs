//! End-to-end admission engine tests against Postgres: the acceptance
//! scenarios, idempotence under concurrency, substitution permanence, and
//! closed-session terminality.

mod common;

use chrono::{NaiveTime, TimeZone, Utc};
use common::{build_test_state, seed_slot, seed_user, ORG};
use rollcall_api::engine::{self, DeviceIdentity};
use rollcall_core::admission::DecisionCode;
use rollcall_core::types::Timestamp;
use rollcall_db::repositories::{AttendanceRepo, SessionRepo};
use sqlx::PgPool;

/// Monday 2025-03-03 at the given time, UTC (= the test wall clock).
fn monday_at(h: u32, m: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2025, 3, 3, h, m, 0).unwrap()
}

fn device() -> DeviceIdentity {
    DeviceIdentity {
        device_id: 1,
        organization_id: ORG,
        room: "R1".to_string(),
    }
}

/// Seed the acceptance-scenario schedule: CS101 in R1, Monday 09:00-10:00.
async fn seed_cs101(pool: &PgPool, teacher_id: i64) -> i64 {
    seed_slot(
        pool,
        "R1",
        0,
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        teacher_id,
    )
    .await
}

// ---------------------------------------------------------------------------
// The full acceptance scenario
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn substitute_teacher_then_students_scenario(pool: PgPool) {
    let t1 = seed_user(&pool, "teacher", "T1", "TAG-T1").await;
    let _t2 = seed_user(&pool, "teacher", "T2", "TAG-T2").await;
    let _s1 = seed_user(&pool, "student", "S1", "TAG-S1").await;
    let _s2 = seed_user(&pool, "student", "S2", "TAG-S2").await;
    seed_cs101(&pool, t1).await;

    let state = build_test_state(pool.clone());

    // T2 (not scheduled) opens the session at 09:05: substitution.
    let outcome = engine::process_scan(&state, &device(), "TAG-T2", monday_at(9, 5)).await;
    assert_eq!(outcome.code, DecisionCode::SessionStarted);
    assert_eq!(outcome.substitution, Some(true));
    let session_id = outcome.session_id.expect("started session id");

    // S1 admitted at 09:06.
    let outcome = engine::process_scan(&state, &device(), "TAG-S1", monday_at(9, 6)).await;
    assert_eq!(outcome.code, DecisionCode::Admitted);
    assert_eq!(outcome.session_id, Some(session_id));

    // S1 re-scans at 09:20: same result, no new record.
    let outcome = engine::process_scan(&state, &device(), "TAG-S1", monday_at(9, 20)).await;
    assert_eq!(outcome.code, DecisionCode::Admitted);

    let records = AttendanceRepo::list_for_session(&pool, session_id).await.unwrap();
    assert_eq!(records.len(), 2, "teacher + S1, no duplicate");

    // S2 at 10:10: past the window and the slot end.
    let outcome = engine::process_scan(&state, &device(), "TAG-S2", monday_at(10, 10)).await;
    assert_eq!(outcome.code, DecisionCode::SessionExpired);

    let records = AttendanceRepo::list_for_session(&pool, session_id).await.unwrap();
    assert_eq!(records.len(), 2, "rejection must not add a record");
}

// ---------------------------------------------------------------------------
// Unknown tag
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_tag_has_no_side_effects(pool: PgPool) {
    let t1 = seed_user(&pool, "teacher", "T1", "TAG-T1").await;
    seed_cs101(&pool, t1).await;

    let state = build_test_state(pool.clone());

    let outcome = engine::process_scan(&state, &device(), "ZZZZ", monday_at(9, 5)).await;
    assert_eq!(outcome.code, DecisionCode::UnknownTag);
    assert!(outcome.session_id.is_none());

    let sessions = SessionRepo::list(&pool, ORG, None, None, 100, 0).await.unwrap();
    assert!(sessions.is_empty(), "no session may be created");
}

// ---------------------------------------------------------------------------
// The 08:00 gap: teacher outside grace, student before any session
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn early_gap_teacher_and_student(pool: PgPool) {
    let t1 = seed_user(&pool, "teacher", "T1", "TAG-T1").await;
    let _s1 = seed_user(&pool, "student", "S1", "TAG-S1").await;
    seed_cs101(&pool, t1).await;

    let state = build_test_state(pool.clone());

    // Teacher at 08:00 for a 09:00 slot: the slot resolves (early access)
    // but the grace window has not opened. No session is created.
    let outcome = engine::process_scan(&state, &device(), "TAG-T1", monday_at(8, 0)).await;
    assert_eq!(outcome.code, DecisionCode::OutsideTeacherWindow);
    let sessions = SessionRepo::list(&pool, ORG, None, None, 100, 0).await.unwrap();
    assert!(sessions.is_empty());

    // A student in that gap materializes the occurrence as WAITING but is
    // not admitted.
    let outcome = engine::process_scan(&state, &device(), "TAG-S1", monday_at(8, 0)).await;
    assert_eq!(outcome.code, DecisionCode::NoSessionYet);
    let sessions = SessionRepo::list(&pool, ORG, None, None, 100, 0).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].status, "waiting_for_teacher");

    // The next student sees the waiting session.
    let outcome = engine::process_scan(&state, &device(), "TAG-S1", monday_at(8, 1)).await;
    assert_eq!(outcome.code, DecisionCode::TeacherNotPresent);

    // The teacher later promotes the same row instead of creating another.
    let outcome = engine::process_scan(&state, &device(), "TAG-T1", monday_at(8, 50)).await;
    assert_eq!(outcome.code, DecisionCode::SessionStarted);
    assert_eq!(outcome.substitution, Some(false));
    assert_eq!(outcome.session_id, Some(sessions[0].id));
}

// ---------------------------------------------------------------------------
// Substitution permanence and the second-teacher anomaly
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn substitution_flag_never_flips_back(pool: PgPool) {
    let t1 = seed_user(&pool, "teacher", "T1", "TAG-T1").await;
    let _t2 = seed_user(&pool, "teacher", "T2", "TAG-T2").await;
    seed_cs101(&pool, t1).await;

    let state = build_test_state(pool.clone());

    let outcome = engine::process_scan(&state, &device(), "TAG-T2", monday_at(9, 5)).await;
    assert_eq!(outcome.code, DecisionCode::SessionStarted);
    let session_id = outcome.session_id.unwrap();

    // The scheduled teacher scanning mid-session is an anomaly: no merge,
    // no substitution flip, no teacher swap.
    let outcome = engine::process_scan(&state, &device(), "TAG-T1", monday_at(9, 10)).await;
    assert_eq!(outcome.code, DecisionCode::Reverified);

    let session = SessionRepo::find_by_id(&pool, session_id).await.unwrap().unwrap();
    assert!(session.substitution, "substitution must not flip back");
    assert_eq!(session.actual_teacher_id, Some(seed_lookup(&pool, "TAG-T2").await));

    // Only the opening teacher's record exists.
    let records = AttendanceRepo::list_for_session(&pool, session_id).await.unwrap();
    assert_eq!(records.len(), 1);
}

/// Resolve a seeded tag back to its user id.
async fn seed_lookup(pool: &PgPool, tag: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE rfid_tag = $1")
        .bind(tag)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Teacher re-verification updates activity, emits no duplicate record
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn teacher_reverification_refreshes_activity(pool: PgPool) {
    let t1 = seed_user(&pool, "teacher", "T1", "TAG-T1").await;
    seed_cs101(&pool, t1).await;

    let state = build_test_state(pool.clone());

    let outcome = engine::process_scan(&state, &device(), "TAG-T1", monday_at(9, 0)).await;
    let session_id = outcome.session_id.unwrap();
    let before = SessionRepo::find_by_id(&pool, session_id).await.unwrap().unwrap();

    let outcome = engine::process_scan(&state, &device(), "TAG-T1", monday_at(9, 30)).await;
    assert_eq!(outcome.code, DecisionCode::Reverified);

    let after = SessionRepo::find_by_id(&pool, session_id).await.unwrap().unwrap();
    assert!(after.last_activity_at > before.last_activity_at);

    let records = AttendanceRepo::list_for_session(&pool, session_id).await.unwrap();
    assert_eq!(records.len(), 1, "re-verification emits no second record");
}

// ---------------------------------------------------------------------------
// Outside operating hours / no schedule
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn scan_outside_operating_hours_is_rejected(pool: PgPool) {
    let t1 = seed_user(&pool, "teacher", "T1", "TAG-T1").await;
    // A late-evening slot whose window reaches past the operating day.
    seed_slot(
        &pool,
        "R1",
        0,
        NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
        t1,
    )
    .await;

    let state = build_test_state(pool);

    let outcome = engine::process_scan(&state, &device(), "TAG-T1", monday_at(22, 30)).await;
    assert_eq!(outcome.code, DecisionCode::NoActiveClass);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn scan_with_no_scheduled_slot_is_rejected(pool: PgPool) {
    let _t1 = seed_user(&pool, "teacher", "T1", "TAG-T1").await;

    let state = build_test_state(pool);

    let outcome = engine::process_scan(&state, &device(), "TAG-T1", monday_at(9, 0)).await;
    assert_eq!(outcome.code, DecisionCode::NoActiveClass);
}

// ---------------------------------------------------------------------------
// Concurrency: a rapid double-tap yields exactly one record
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn concurrent_double_tap_admits_once(pool: PgPool) {
    let t1 = seed_user(&pool, "teacher", "T1", "TAG-T1").await;
    let _s1 = seed_user(&pool, "student", "S1", "TAG-S1").await;
    seed_cs101(&pool, t1).await;

    let state = build_test_state(pool.clone());

    let outcome = engine::process_scan(&state, &device(), "TAG-T1", monday_at(9, 0)).await;
    let session_id = outcome.session_id.unwrap();

    // Two concurrent scans of the same student race through the engine;
    // the occurrence lock serializes them.
    let dev = device();
    let (a, b) = tokio::join!(
        engine::process_scan(&state, &dev, "TAG-S1", monday_at(9, 2)),
        engine::process_scan(&state, &dev, "TAG-S1", monday_at(9, 2)),
    );
    assert_eq!(a.code, DecisionCode::Admitted);
    assert_eq!(b.code, DecisionCode::Admitted);

    let records = AttendanceRepo::list_for_session(&pool, session_id).await.unwrap();
    assert_eq!(records.len(), 2, "teacher + exactly one student record");
}

// ---------------------------------------------------------------------------
// Closed sessions stay closed
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn closed_session_rejects_further_scans(pool: PgPool) {
    let t1 = seed_user(&pool, "teacher", "T1", "TAG-T1").await;
    let _s1 = seed_user(&pool, "student", "S1", "TAG-S1").await;
    seed_cs101(&pool, t1).await;

    let state = build_test_state(pool.clone());

    let outcome = engine::process_scan(&state, &device(), "TAG-T1", monday_at(9, 0)).await;
    let session_id = outcome.session_id.unwrap();

    SessionRepo::close(&pool, session_id, monday_at(9, 30)).await.unwrap();

    let outcome = engine::process_scan(&state, &device(), "TAG-S1", monday_at(9, 31)).await;
    assert_eq!(outcome.code, DecisionCode::SessionClosed);

    let outcome = engine::process_scan(&state, &device(), "TAG-T1", monday_at(9, 31)).await;
    assert_eq!(outcome.code, DecisionCode::SessionClosed);

    // The closed session is never resurrected.
    let session = SessionRepo::find_by_id(&pool, session_id).await.unwrap().unwrap();
    assert_eq!(session.status, "closed");
}

// ---------------------------------------------------------------------------
// Late admission threshold
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn student_past_late_threshold_is_admitted_late(pool: PgPool) {
    let t1 = seed_user(&pool, "teacher", "T1", "TAG-T1").await;
    let _s1 = seed_user(&pool, "student", "S1", "TAG-S1").await;
    seed_cs101(&pool, t1).await;

    let state = build_test_state(pool.clone());

    let outcome = engine::process_scan(&state, &device(), "TAG-T1", monday_at(9, 0)).await;
    let session_id = outcome.session_id.unwrap();

    // 15 minutes after session start: past late_after (10), inside the
    // first-slot window (30).
    let outcome = engine::process_scan(&state, &device(), "TAG-S1", monday_at(9, 15)).await;
    assert_eq!(outcome.code, DecisionCode::AdmittedLate);

    let records = AttendanceRepo::list_for_session(&pool, session_id).await.unwrap();
    let student_record = records.iter().find(|r| r.role_at_scan == "student").unwrap();
    assert_eq!(student_record.status, "late");
    assert_eq!(student_record.points_earned, 5);
}
