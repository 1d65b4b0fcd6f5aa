//! Route definitions for session queries and administrative closure.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sessions;
use crate::state::AppState;

/// Session routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orgs/{org_id}/sessions", get(sessions::list_sessions))
        .route("/sessions/{id}", get(sessions::get_session))
        .route(
            "/sessions/{id}/records",
            get(sessions::list_session_records),
        )
        .route("/sessions/{id}/close", post(sessions::close_session))
        .route(
            "/orgs/{org_id}/rooms/{room}/current-session",
            get(sessions::current_session_for_room),
        )
}
