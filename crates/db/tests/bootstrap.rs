use sqlx::PgPool;

/// Full bootstrap test: connect, migrate, verify schema.
#[sqlx::test(migrations = "./migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    // Health check
    rollcall_db::health_check(&pool).await.unwrap();

    // Verify all tables exist and are queryable.
    let tables = [
        "users",
        "schedule_slots",
        "org_policies",
        "attendance_sessions",
        "attendance_records",
        "devices",
        "events",
    ];

    for table in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}

/// The occurrence uniqueness constraint is present and named.
#[sqlx::test(migrations = "./migrations")]
async fn test_occurrence_constraint_exists(pool: PgPool) {
    let name: (String,) = sqlx::query_as(
        "SELECT conname::text FROM pg_constraint
         WHERE conname = 'uq_attendance_sessions_occurrence'",
    )
    .fetch_one(&pool)
    .await
    .expect("occurrence uniqueness constraint must exist");
    assert_eq!(name.0, "uq_attendance_sessions_occurrence");
}
