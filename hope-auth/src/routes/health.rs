use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use hope_shared::types::api::{HealthCheck, HealthResponse, HealthStatus};

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> Response {
    let mut checks = vec![HealthCheck::from_result("database", state.users.ping().await)];
    if let Some(redis) = &state.redis {
        checks.push(HealthCheck::from_result("redis", redis.ping().await));
    }

    let health = HealthResponse::healthy("hope-auth", env!("CARGO_PKG_VERSION")).with_checks(checks);
    let status = if health.status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status, Json(health)).into_response()
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
