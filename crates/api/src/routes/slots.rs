//! Route definitions for schedule slots.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::slots;
use crate::state::AppState;

/// Slot routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/orgs/{org_id}/slots",
            post(slots::create_slot).get(slots::list_slots),
        )
        .route(
            "/slots/{id}",
            get(slots::get_slot)
                .put(slots::update_slot)
                .delete(slots::deactivate_slot),
        )
}
