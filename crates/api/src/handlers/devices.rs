//! Handlers for device registration and management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};

use rollcall_core::error::CoreError;
use rollcall_core::types::DbId;
use rollcall_db::models::device::{CreateDevice, Device};
use rollcall_db::repositories::DeviceRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Response for a freshly registered device.
///
/// The plain key appears here exactly once; only its digest is stored.
#[derive(Debug, Serialize)]
pub struct RegisteredDevice {
    #[serde(flatten)]
    pub device: Device,
    pub device_key: String,
}

// ---------------------------------------------------------------------------
// GET /orgs/{org_id}/devices
// ---------------------------------------------------------------------------

/// List an organization's devices.
pub async fn list_devices(
    State(state): State<AppState>,
    Path(org_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let devices = DeviceRepo::list(&state.pool, org_id).await?;

    tracing::debug!(org_id, count = devices.len(), "Listed devices");

    Ok(Json(DataResponse { data: devices }))
}

// ---------------------------------------------------------------------------
// POST /orgs/{org_id}/devices
// ---------------------------------------------------------------------------

/// Register a new room device and hand back its key, once.
pub async fn create_device(
    State(state): State<AppState>,
    Path(org_id): Path<DbId>,
    Json(body): Json<CreateDevice>,
) -> AppResult<impl IntoResponse> {
    if body.room.trim().is_empty() {
        return Err(AppError::BadRequest("room must not be empty".to_string()));
    }

    let mut key_bytes = [0u8; 32];
    rand::rng().fill(&mut key_bytes);
    let device_key = hex::encode(key_bytes);
    let key_hash = hex::encode(Sha256::digest(device_key.as_bytes()));

    let device = DeviceRepo::create(&state.pool, org_id, &body, &key_hash).await?;

    tracing::info!(device_id = device.id, org_id, room = %device.room, "Device registered");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: RegisteredDevice { device, device_key },
        }),
    ))
}

// ---------------------------------------------------------------------------
// DELETE /devices/{id}
// ---------------------------------------------------------------------------

/// Deactivate a device. Existing connections keep their binding until
/// they drop; new handshakes with its key fail.
pub async fn deactivate_device(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deactivated = DeviceRepo::deactivate(&state.pool, id).await?;
    if !deactivated {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Device",
            id,
        }));
    }

    tracing::info!(device_id = id, "Device deactivated");

    Ok(StatusCode::NO_CONTENT)
}
