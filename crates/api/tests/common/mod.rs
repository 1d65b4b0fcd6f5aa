//! Shared helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use chrono::NaiveTime;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use rollcall_api::config::ServerConfig;
use rollcall_api::engine::locks::SessionLockMap;
use rollcall_api::routes;
use rollcall_api::state::AppState;
use rollcall_api::ws::DeviceManager;
use rollcall_core::types::DbId;

/// Organization used by all seeded fixtures.
pub const ORG: DbId = 1;

/// Build a test `ServerConfig` with safe defaults.
///
/// Zero UTC offset so test timestamps are the schedule wall clock.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        utc_offset_minutes: 0,
        sweep_interval_secs: 60,
    }
}

/// Build the shared application state over the given pool.
pub fn build_test_state(pool: PgPool) -> AppState {
    AppState {
        pool,
        config: Arc::new(test_config()),
        device_manager: Arc::new(DeviceManager::new()),
        event_bus: Arc::new(rollcall_events::EventBus::default()),
        session_locks: Arc::new(SessionLockMap::new()),
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    let state = build_test_state(pool);

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Perform a GET request against the app.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Perform a POST request with a JSON body.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Perform a PUT request with a JSON body.
pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::PUT)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Perform a DELETE request against the app.
pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body into JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Seed helpers
// ---------------------------------------------------------------------------

/// Insert a directory user and return its id.
pub async fn seed_user(pool: &PgPool, role: &str, name: &str, tag: &str) -> DbId {
    sqlx::query_scalar::<_, DbId>(
        "INSERT INTO users (organization_id, display_name, role, rfid_tag)
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(ORG)
    .bind(name)
    .bind(role)
    .bind(tag)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Insert an active schedule slot and return its id.
pub async fn seed_slot(
    pool: &PgPool,
    room: &str,
    day_of_week: i16,
    start: NaiveTime,
    end: NaiveTime,
    teacher_id: DbId,
) -> DbId {
    sqlx::query_scalar::<_, DbId>(
        "INSERT INTO schedule_slots
             (organization_id, room, day_of_week, start_time, end_time,
              scheduled_teacher_id, course_code, course_name)
         VALUES ($1, $2, $3, $4, $5, $6, 'CS101', 'Intro to CS') RETURNING id",
    )
    .bind(ORG)
    .bind(room)
    .bind(day_of_week)
    .bind(start)
    .bind(end)
    .bind(teacher_id)
    .fetch_one(pool)
    .await
    .unwrap()
}
