use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;

use hope_shared::errors::{AppError, AppResult, ErrorCode};
use hope_shared::extract::JsonBody;
use hope_shared::middleware::record_auth_event;
use hope_shared::types::{ApiResponse, Empty};

use crate::routes::non_empty;
use crate::services::auth_service;
use crate::services::phone::PhoneNumber;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub otp: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

pub async fn reset_password(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ResetPasswordRequest>,
) -> AppResult<Json<ApiResponse<Empty>>> {
    let (Some(phone_number), Some(otp), Some(new_password)) = (
        non_empty(&req.phone_number),
        non_empty(&req.otp),
        req.new_password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::validation(
            "Phone number, OTP, and new password are required",
        ));
    };

    let phone = PhoneNumber::normalize(phone_number, &state.config.default_country_code)?;

    let user = state
        .users
        .find_by_phone(phone.digits())
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "User not found"))?;

    let window = Duration::seconds(state.config.verification_window_secs);
    let verified = state
        .verifications
        .get(&phone)
        .await?
        .is_some_and(|entry| entry.is_valid_for(otp, Utc::now(), window));
    if !verified {
        record_auth_event("password_reset", "rejected");
        return Err(AppError::new(ErrorCode::OtpInvalidOrExpired, "Invalid or expired OTP"));
    }

    auth_service::validate_password(new_password)?;
    let password_hash = auth_service::hash_password(new_password)?;
    state.users.update_password(user.id, &password_hash).await?;

    if let Err(e) = state.verifications.remove(&phone).await {
        tracing::warn!(error = %e, "failed to clear used verification");
    }

    record_auth_event("password_reset", "success");
    tracing::info!(user_id = %user.id, phone = %phone.masked(), "password reset");

    Ok(Json(ApiResponse::<Empty>::message("Password reset successful")))
}
