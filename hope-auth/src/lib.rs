use std::sync::Arc;

use axum::extract::FromRef;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use hope_shared::clients::redis::RedisClient;
use hope_shared::SessionIssuer;

pub mod config;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;

#[cfg(test)]
mod testing;

use crate::config::AppConfig;
use crate::services::otp::{OtpGateway, SmsNotifier};
use crate::services::verification::VerificationStore;
use crate::store::UserStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub otp: Arc<dyn OtpGateway>,
    pub verifications: Arc<dyn VerificationStore>,
    /// Welcome SMS channel; `None` when no sender number is configured.
    pub sms: Option<Arc<dyn SmsNotifier>>,
    pub sessions: SessionIssuer,
    pub redis: Option<RedisClient>,
    pub metrics: Option<PrometheusHandle>,
}

impl FromRef<AppState> for SessionIssuer {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

pub fn router(state: AppState) -> Router {
    let auth = Router::new()
        .route("/request-otp", post(routes::request_otp::request_otp))
        .route("/verify-otp", post(routes::verify_otp::verify_otp))
        .route("/register", post(routes::register::register))
        .route("/login", post(routes::login::login))
        .route("/me", get(routes::me::me))
        .route("/reset-password", post(routes::reset_password::reset_password));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .nest("/auth", auth)
        .layer(axum::middleware::from_fn(hope_shared::middleware::metrics_middleware))
        .layer(CatchPanicLayer::custom(hope_shared::middleware::panic_response))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
