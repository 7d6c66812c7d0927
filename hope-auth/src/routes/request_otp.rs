use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use hope_shared::errors::{AppError, AppResult};
use hope_shared::extract::JsonBody;
use hope_shared::middleware::record_auth_event;
use hope_shared::types::ApiResponse;

use crate::routes::non_empty;
use crate::services::phone::PhoneNumber;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOtpRequest {
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OtpStatusResponse {
    pub status: String,
}

/// Ask the provider to text a fresh code. Calling again simply sends another.
pub async fn request_otp(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RequestOtpRequest>,
) -> AppResult<Json<ApiResponse<OtpStatusResponse>>> {
    let (Some(phone_number), Some(country_code)) =
        (non_empty(&req.phone_number), non_empty(&req.country_code))
    else {
        return Err(AppError::validation("Phone number and country code are required"));
    };

    let phone = PhoneNumber::normalize(phone_number, country_code)?;

    let dispatch = state.otp.request_code(&phone).await.map_err(|e| {
        tracing::error!(phone = %phone.masked(), error = %e, "failed to send OTP");
        record_auth_event("otp_request", "failed");
        AppError::upstream(e.to_string())
    })?;

    record_auth_event("otp_request", "sent");
    tracing::info!(phone = %phone.masked(), status = %dispatch.status, "OTP sent");

    Ok(Json(ApiResponse::ok_with_message(
        OtpStatusResponse { status: dispatch.status },
        "OTP sent successfully",
    )))
}
