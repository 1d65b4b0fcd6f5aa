//! Repository-level tests for the session lifecycle: occurrence
//! uniqueness, the start/admit/close transitions, and the attendance
//! record idempotence backstop.

use chrono::{NaiveDate, NaiveTime, Utc};
use rollcall_core::types::DbId;
use rollcall_db::models::session::SessionOccurrence;
use rollcall_db::repositories::{AttendanceRepo, PolicyRepo, SessionRepo};
use rollcall_core::policy::PolicyUpdate;
use sqlx::PgPool;

const ORG: DbId = 1;

async fn seed_teacher(pool: &PgPool, tag: &str) -> DbId {
    sqlx::query_scalar::<_, DbId>(
        "INSERT INTO users (organization_id, display_name, role, rfid_tag)
         VALUES ($1, 'Teacher', 'teacher', $2) RETURNING id",
    )
    .bind(ORG)
    .bind(tag)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn seed_student(pool: &PgPool, tag: &str) -> DbId {
    sqlx::query_scalar::<_, DbId>(
        "INSERT INTO users (organization_id, display_name, role, rfid_tag)
         VALUES ($1, 'Student', 'student', $2) RETURNING id",
    )
    .bind(ORG)
    .bind(tag)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn seed_slot(pool: &PgPool, teacher_id: DbId) -> DbId {
    sqlx::query_scalar::<_, DbId>(
        "INSERT INTO schedule_slots
             (organization_id, room, day_of_week, start_time, end_time,
              scheduled_teacher_id, course_code, course_name)
         VALUES ($1, 'R1', 0, $2, $3, $4, 'CS101', 'Intro to CS') RETURNING id",
    )
    .bind(ORG)
    .bind(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
    .bind(NaiveTime::from_hms_opt(10, 0, 0).unwrap())
    .bind(teacher_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
}

fn occurrence(slot_id: DbId, teacher_id: DbId) -> SessionOccurrence {
    SessionOccurrence {
        organization_id: ORG,
        room: "R1".to_string(),
        slot_id,
        day: monday(),
        scheduled_teacher_id: teacher_id,
    }
}

// ---------------------------------------------------------------------------
// Occurrence uniqueness
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_occurrence_insert_is_rejected(pool: PgPool) {
    let teacher = seed_teacher(&pool, "T-1").await;
    let slot = seed_slot(&pool, teacher).await;
    let occ = occurrence(slot, teacher);
    let now = Utc::now();

    SessionRepo::create_waiting(&pool, &occ, now).await.unwrap();
    let dup = SessionRepo::create_waiting(&pool, &occ, now).await;

    assert!(dup.is_err(), "second session for one occurrence must fail");
}

// ---------------------------------------------------------------------------
// Start and promote
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn start_creates_active_session_with_teacher_record(pool: PgPool) {
    let teacher = seed_teacher(&pool, "T-1").await;
    let slot = seed_slot(&pool, teacher).await;
    let now = Utc::now();

    let session = SessionRepo::start(
        &pool,
        &occurrence(slot, teacher),
        None,
        teacher,
        false,
        "present",
        10,
        now,
    )
    .await
    .unwrap();

    assert_eq!(session.status, "active");
    assert_eq!(session.actual_teacher_id, Some(teacher));
    assert!(!session.substitution);
    assert!(session.started_at.is_some());
    assert!(AttendanceRepo::exists(&pool, session.id, teacher).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn start_promotes_waiting_session(pool: PgPool) {
    let scheduled = seed_teacher(&pool, "T-1").await;
    let substitute = seed_teacher(&pool, "T-2").await;
    let slot = seed_slot(&pool, scheduled).await;
    let occ = occurrence(slot, scheduled);
    let now = Utc::now();

    let waiting = SessionRepo::create_waiting(&pool, &occ, now).await.unwrap();
    assert_eq!(waiting.status, "waiting_for_teacher");

    let session = SessionRepo::start(
        &pool,
        &occ,
        Some(waiting.id),
        substitute,
        true,
        "substituted",
        10,
        now,
    )
    .await
    .unwrap();

    assert_eq!(session.id, waiting.id, "promotion must keep the row");
    assert_eq!(session.status, "active");
    assert!(session.substitution);
    assert_eq!(session.actual_teacher_id, Some(substitute));
}

// ---------------------------------------------------------------------------
// Student admission and idempotence backstop
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_student_record_is_rejected_by_constraint(pool: PgPool) {
    let teacher = seed_teacher(&pool, "T-1").await;
    let student = seed_student(&pool, "S-1").await;
    let slot = seed_slot(&pool, teacher).await;
    let now = Utc::now();

    let session = SessionRepo::start(
        &pool,
        &occurrence(slot, teacher),
        None,
        teacher,
        false,
        "present",
        10,
        now,
    )
    .await
    .unwrap();

    SessionRepo::admit_student(&pool, session.id, student, "present", 10, now)
        .await
        .unwrap();
    assert!(AttendanceRepo::exists(&pool, session.id, student).await.unwrap());

    let dup = SessionRepo::admit_student(&pool, session.id, student, "present", 10, now).await;
    assert!(dup.is_err(), "unique constraint must reject the duplicate");

    // The failed transaction must not have bumped anything: still exactly
    // two records (teacher + student).
    let records = AttendanceRepo::list_for_session(&pool, session.id).await.unwrap();
    assert_eq!(records.len(), 2);
}

// ---------------------------------------------------------------------------
// Closure
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn close_is_terminal(pool: PgPool) {
    let teacher = seed_teacher(&pool, "T-1").await;
    let slot = seed_slot(&pool, teacher).await;
    let now = Utc::now();

    let session = SessionRepo::start(
        &pool,
        &occurrence(slot, teacher),
        None,
        teacher,
        false,
        "present",
        10,
        now,
    )
    .await
    .unwrap();

    assert!(SessionRepo::close(&pool, session.id, now).await.unwrap());
    // Closing again is a no-op.
    assert!(!SessionRepo::close(&pool, session.id, now).await.unwrap());

    let closed = SessionRepo::find_by_id(&pool, session.id).await.unwrap().unwrap();
    assert_eq!(closed.status, "closed");
    assert!(closed.closed_at.is_some());

    // A closed session leaves the open-for-room view empty.
    let open = SessionRepo::find_open_for_room(&pool, ORG, "R1", monday())
        .await
        .unwrap();
    assert!(open.is_none());
}

// ---------------------------------------------------------------------------
// Policy store
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn policy_defaults_when_no_row(pool: PgPool) {
    let policy = PolicyRepo::get(&pool, ORG).await.unwrap();
    assert_eq!(policy, rollcall_core::policy::PolicySettings::default());
}

#[sqlx::test(migrations = "./migrations")]
async fn policy_upsert_merges_partially(pool: PgPool) {
    let update = PolicyUpdate {
        teacher_grace_mins: Some(30),
        ..PolicyUpdate::default()
    };
    let merged = PolicyRepo::upsert(&pool, ORG, &update).await.unwrap();
    assert_eq!(merged.teacher_grace_mins, 30);

    // A later read reflects the committed write; untouched fields keep
    // their defaults.
    let read_back = PolicyRepo::get(&pool, ORG).await.unwrap();
    assert_eq!(read_back.teacher_grace_mins, 30);
    assert_eq!(
        read_back.student_regular_window_mins,
        rollcall_core::policy::DEFAULT_STUDENT_REGULAR_WINDOW_MINS
    );

    // Second partial update keeps the first one's value.
    let update2 = PolicyUpdate {
        points_late: Some(3),
        ..PolicyUpdate::default()
    };
    let merged2 = PolicyRepo::upsert(&pool, ORG, &update2).await.unwrap();
    assert_eq!(merged2.teacher_grace_mins, 30);
    assert_eq!(merged2.points_late, 3);
}
