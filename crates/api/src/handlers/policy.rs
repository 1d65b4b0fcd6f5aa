//! Handlers for organization policy settings.
//!
//! The engine reads the stored policy on every decision, so updates here
//! take effect for in-flight sessions without a restart.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use rollcall_core::policy::PolicyUpdate;
use rollcall_core::types::DbId;
use rollcall_db::repositories::PolicyRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /orgs/{org_id}/policy
// ---------------------------------------------------------------------------

/// Effective policy for an organization (stored override or defaults).
pub async fn get_policy(
    State(state): State<AppState>,
    Path(org_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let policy = PolicyRepo::get(&state.pool, org_id).await?;
    Ok(Json(DataResponse { data: policy }))
}

// ---------------------------------------------------------------------------
// PUT /orgs/{org_id}/policy
// ---------------------------------------------------------------------------

/// Merge a partial update into the organization's policy.
pub async fn update_policy(
    State(state): State<AppState>,
    Path(org_id): Path<DbId>,
    Json(body): Json<PolicyUpdate>,
) -> AppResult<impl IntoResponse> {
    // Validate the would-be result before committing anything.
    let current = PolicyRepo::get(&state.pool, org_id).await?;
    current.merged(&body).validate()?;

    let policy = PolicyRepo::upsert(&state.pool, org_id, &body).await?;

    tracing::info!(org_id, "Policy settings updated");

    Ok(Json(DataResponse { data: policy }))
}
