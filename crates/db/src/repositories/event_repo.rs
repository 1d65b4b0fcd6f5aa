//! Repository for the `events` audit table.

use rollcall_core::types::DbId;
use sqlx::PgPool;

/// Append-only audit event writes.
pub struct EventRepo;

impl EventRepo {
    /// Insert an event row, returning its id.
    pub async fn insert(
        pool: &PgPool,
        event_type: &str,
        room: Option<&str>,
        session_id: Option<DbId>,
        person_id: Option<DbId>,
        payload: &serde_json::Value,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO events (event_type, room, session_id, person_id, payload)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(event_type)
        .bind(room)
        .bind(session_id)
        .bind(person_id)
        .bind(payload)
        .fetch_one(pool)
        .await
    }
}
