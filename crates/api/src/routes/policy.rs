//! Route definitions for organization policy settings.

use axum::routing::get;
use axum::Router;

use crate::handlers::policy;
use crate::state::AppState;

/// Policy routes.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/orgs/{org_id}/policy",
        get(policy::get_policy).put(policy::update_policy),
    )
}
