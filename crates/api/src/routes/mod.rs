pub mod devices;
pub mod health;
pub mod policy;
pub mod sessions;
pub mod slots;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws/device                                       device gateway WebSocket
///
/// /orgs/{org_id}/policy                            get, update (PUT)
///
/// /orgs/{org_id}/slots                             list, create
/// /slots/{id}                                      get, update, deactivate
///
/// /orgs/{org_id}/sessions                          list (?room, ?day)
/// /sessions/{id}                                   get
/// /sessions/{id}/records                           attendance records
/// /sessions/{id}/close                             force-close (POST)
/// /orgs/{org_id}/rooms/{room}/current-session      live dashboard view
///
/// /orgs/{org_id}/devices                           list, register
/// /devices/{id}                                    deactivate
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws/device", get(ws::ws_handler))
        .merge(policy::router())
        .merge(slots::router())
        .merge(sessions::router())
        .merge(devices::router())
}
