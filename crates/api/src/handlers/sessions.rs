//! Handlers for session queries and administrative closure.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;

use rollcall_core::error::CoreError;
use rollcall_core::types::DbId;
use rollcall_db::models::session::AttendanceSession;
use rollcall_db::repositories::{AttendanceRepo, SessionRepo};
use rollcall_events::DomainEvent;

use crate::engine::locks::SessionKey;
use crate::error::{AppError, AppResult};
use crate::query::SessionFilterParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch a session or produce the standard 404.
async fn ensure_session_exists(
    pool: &sqlx::PgPool,
    id: DbId,
) -> AppResult<AttendanceSession> {
    SessionRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "AttendanceSession",
            id,
        }))
}

// ---------------------------------------------------------------------------
// GET /orgs/{org_id}/sessions
// ---------------------------------------------------------------------------

/// List sessions with optional room/day filters.
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(org_id): Path<DbId>,
    Query(params): Query<SessionFilterParams>,
) -> AppResult<impl IntoResponse> {
    let sessions = SessionRepo::list(
        &state.pool,
        org_id,
        params.room.as_deref(),
        params.day,
        params.limit(),
        params.offset(),
    )
    .await?;

    tracing::debug!(org_id, count = sessions.len(), "Listed sessions");

    Ok(Json(DataResponse { data: sessions }))
}

// ---------------------------------------------------------------------------
// GET /sessions/{id}
// ---------------------------------------------------------------------------

/// Get a single session by ID.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let session = ensure_session_exists(&state.pool, id).await?;
    Ok(Json(DataResponse { data: session }))
}

// ---------------------------------------------------------------------------
// GET /sessions/{id}/records
// ---------------------------------------------------------------------------

/// Attendance records for a session, in scan order. The export feed.
pub async fn list_session_records(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_session_exists(&state.pool, id).await?;
    let records = AttendanceRepo::list_for_session(&state.pool, id).await?;
    Ok(Json(DataResponse { data: records }))
}

// ---------------------------------------------------------------------------
// POST /sessions/{id}/close
// ---------------------------------------------------------------------------

/// Administrative force-close.
///
/// Takes the same per-occurrence lock as the scan path, so a concurrent
/// scan either completes before the close or observes the closed session.
pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let session = ensure_session_exists(&state.pool, id).await?;

    let key = SessionKey {
        organization_id: session.organization_id,
        room: session.room.clone(),
        slot_id: session.slot_id,
        day: session.day,
    };
    let lock = state.session_locks.lock_for(&key).await;
    let _guard = lock.lock().await;

    let closed = SessionRepo::close(&state.pool, id, chrono::Utc::now()).await?;
    if !closed {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "session {id} is already closed"
        ))));
    }

    tracing::info!(session_id = id, room = %session.room, "Session force-closed");
    state.event_bus.publish(
        DomainEvent::new("session.force_closed")
            .with_room(session.room.as_str())
            .with_session(id),
    );

    let session = ensure_session_exists(&state.pool, id).await?;
    Ok(Json(DataResponse { data: session }))
}

// ---------------------------------------------------------------------------
// GET /orgs/{org_id}/rooms/{room}/current-session
// ---------------------------------------------------------------------------

/// The open session in a room today, if any, plus the count of devices
/// currently connected for it. The live dashboard view.
pub async fn current_session_for_room(
    State(state): State<AppState>,
    Path((org_id, room)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let today = state.config.to_wall(chrono::Utc::now()).date();
    let session = SessionRepo::find_open_for_room(&state.pool, org_id, &room, today).await?;
    let connected_devices = state.device_manager.count_for_room(org_id, &room).await;

    Ok(Json(DataResponse {
        data: serde_json::json!({
            "session": session,
            "connected_devices": connected_devices,
        }),
    }))
}
