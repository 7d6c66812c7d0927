use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use hope_shared::errors::{AppError, AppResult, ErrorCode};
use hope_shared::extract::JsonBody;
use hope_shared::middleware::record_auth_event;
use hope_shared::types::ApiResponse;

use crate::routes::non_empty;
use crate::services::phone::PhoneNumber;
use crate::services::verification::PendingVerification;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub otp: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub status: String,
}

/// Check a submitted code with the provider. An approved code is remembered
/// for the verification window so register / reset-password can rely on it.
pub async fn verify_otp(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<VerifyOtpRequest>,
) -> AppResult<Json<ApiResponse<VerifyOtpResponse>>> {
    let (Some(phone_number), Some(country_code), Some(otp)) = (
        non_empty(&req.phone_number),
        non_empty(&req.country_code),
        non_empty(&req.otp),
    ) else {
        return Err(AppError::validation("Phone number, country code, and OTP are required"));
    };

    let phone = PhoneNumber::normalize(phone_number, country_code)?;

    let check = state.otp.check_code(&phone, otp).await.map_err(|e| {
        tracing::error!(phone = %phone.masked(), error = %e, "failed to verify OTP");
        AppError::upstream(e.to_string())
    })?;

    if !check.approved {
        record_auth_event("otp_verify", "rejected");
        tracing::info!(phone = %phone.masked(), status = %check.status, "OTP rejected");
        return Err(AppError::with_provider_status(ErrorCode::OtpRejected, "Invalid OTP", check.status));
    }

    state
        .verifications
        .record(&phone, &PendingVerification::new(otp, Utc::now()))
        .await?;

    record_auth_event("otp_verify", "approved");
    tracing::info!(phone = %phone.masked(), "OTP verified");

    Ok(Json(ApiResponse::ok_with_message(
        VerifyOtpResponse { status: check.status },
        "OTP verified successfully",
    )))
}
