//! Route definitions for device management.

use axum::routing::{delete, post};
use axum::Router;

use crate::handlers::devices;
use crate::state::AppState;

/// Device routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/orgs/{org_id}/devices",
            post(devices::create_device).get(devices::list_devices),
        )
        .route("/devices/{id}", delete(devices::deactivate_device))
}
