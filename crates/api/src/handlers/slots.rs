//! Handlers for schedule slot definitions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use rollcall_core::error::CoreError;
use rollcall_core::types::DbId;
use rollcall_db::models::slot::{CreateScheduleSlot, UpdateScheduleSlot};
use rollcall_db::repositories::SlotRepo;

use crate::error::{AppError, AppResult};
use crate::query::IncludeInactiveParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Field-level checks shared by create and update.
fn validate_slot_fields(
    room: Option<&str>,
    day_of_week: Option<i16>,
    interval: Option<(chrono::NaiveTime, chrono::NaiveTime)>,
) -> Result<(), AppError> {
    if let Some(room) = room {
        if room.trim().is_empty() {
            return Err(AppError::BadRequest("room must not be empty".to_string()));
        }
    }
    if let Some(day) = day_of_week {
        if !(0..=6).contains(&day) {
            return Err(AppError::BadRequest(
                "day_of_week must be within 0..=6 (Monday = 0)".to_string(),
            ));
        }
    }
    if let Some((start, end)) = interval {
        if start >= end {
            return Err(AppError::BadRequest(
                "start_time must be before end_time".to_string(),
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// GET /orgs/{org_id}/slots
// ---------------------------------------------------------------------------

/// List an organization's slots.
pub async fn list_slots(
    State(state): State<AppState>,
    Path(org_id): Path<DbId>,
    Query(params): Query<IncludeInactiveParams>,
) -> AppResult<impl IntoResponse> {
    let slots = SlotRepo::list(&state.pool, org_id, params.include_inactive).await?;

    tracing::debug!(org_id, count = slots.len(), "Listed schedule slots");

    Ok(Json(DataResponse { data: slots }))
}

// ---------------------------------------------------------------------------
// POST /orgs/{org_id}/slots
// ---------------------------------------------------------------------------

/// Create a new schedule slot.
pub async fn create_slot(
    State(state): State<AppState>,
    Path(org_id): Path<DbId>,
    Json(body): Json<CreateScheduleSlot>,
) -> AppResult<impl IntoResponse> {
    validate_slot_fields(
        Some(&body.room),
        Some(body.day_of_week),
        Some((body.start_time, body.end_time)),
    )?;

    let slot = SlotRepo::create(&state.pool, org_id, &body).await?;

    tracing::info!(slot_id = slot.id, org_id, room = %slot.room, "Schedule slot created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: slot })))
}

// ---------------------------------------------------------------------------
// GET /slots/{id}
// ---------------------------------------------------------------------------

/// Get a single slot by ID.
pub async fn get_slot(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let slot = SlotRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ScheduleSlot",
            id,
        }))?;
    Ok(Json(DataResponse { data: slot }))
}

// ---------------------------------------------------------------------------
// PUT /slots/{id}
// ---------------------------------------------------------------------------

/// Update an existing slot.
pub async fn update_slot(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<UpdateScheduleSlot>,
) -> AppResult<impl IntoResponse> {
    let existing = SlotRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ScheduleSlot",
            id,
        }))?;

    // Validate the interval the row would end up with, not just the
    // fields present in the patch.
    let start = body.start_time.unwrap_or(existing.start_time);
    let end = body.end_time.unwrap_or(existing.end_time);
    validate_slot_fields(body.room.as_deref(), body.day_of_week, Some((start, end)))?;

    let slot = SlotRepo::update(&state.pool, id, &body)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ScheduleSlot",
            id,
        }))?;

    tracing::info!(slot_id = slot.id, "Schedule slot updated");

    Ok(Json(DataResponse { data: slot }))
}

// ---------------------------------------------------------------------------
// DELETE /slots/{id}
// ---------------------------------------------------------------------------

/// Soft-deactivate a slot. Sessions already created from it are untouched.
pub async fn deactivate_slot(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deactivated = SlotRepo::deactivate(&state.pool, id).await?;
    if !deactivated {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "ScheduleSlot",
            id,
        }));
    }

    tracing::info!(slot_id = id, "Schedule slot deactivated");

    Ok(StatusCode::NO_CONTENT)
}
