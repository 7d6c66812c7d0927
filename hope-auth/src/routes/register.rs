use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hope_shared::errors::{AppError, AppResult, ErrorCode};
use hope_shared::extract::JsonBody;
use hope_shared::middleware::record_auth_event;
use hope_shared::types::auth::UserRole;
use hope_shared::types::ApiResponse;

use crate::models::{NewUser, Permissions, PermissionsPayload, MAX_TEXT_LEN};
use crate::routes::non_empty;
use crate::services::auth_service;
use crate::services::phone::PhoneNumber;
use crate::AppState;

const WELCOME_MESSAGE: &str = "Welcome to Hope-AI! Your account has been successfully created.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub otp: Option<String>,
    #[serde(default)]
    pub permissions: Option<PermissionsPayload>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub phone_number: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub token: String,
    pub user: RegisteredUser,
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<RegisterResponse>>)> {
    let (Some(phone_number), Some(name), Some(email), Some(password), Some(otp)) = (
        non_empty(&req.phone_number),
        non_empty(&req.name),
        non_empty(&req.email),
        req.password.as_deref().filter(|p| !p.is_empty()),
        non_empty(&req.otp),
    ) else {
        return Err(AppError::validation("All fields are required"));
    };

    let phone = PhoneNumber::normalize(phone_number, &state.config.default_country_code)?;
    let email = email.to_lowercase();

    if state.users.find_by_phone(phone.digits()).await?.is_some() {
        return Err(AppError::new(ErrorCode::UserAlreadyExists, "User already exists"));
    }
    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::new(ErrorCode::UserAlreadyExists, "Email already registered"));
    }

    if name.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::validation(format!(
            "Name must be at most {MAX_TEXT_LEN} characters"
        )));
    }
    if email.chars().count() > MAX_TEXT_LEN || !validator::validate_email(&email) {
        return Err(AppError::validation("Invalid email format"));
    }
    auth_service::validate_password(password)?;

    if state.config.require_verified_phone {
        let window = Duration::seconds(state.config.verification_window_secs);
        let verified = state
            .verifications
            .get(&phone)
            .await?
            .is_some_and(|entry| entry.is_valid_for(otp, Utc::now(), window));
        if !verified {
            record_auth_event("register", "unverified");
            return Err(AppError::new(
                ErrorCode::OtpInvalidOrExpired,
                "Phone number has not been verified or the OTP has expired",
            ));
        }
    }

    let password_hash = auth_service::hash_password(password)?;
    let user_id = Uuid::now_v7();
    let permission = Permissions::from_client(req.permissions.as_ref()).into_new(user_id);

    let new_user = NewUser {
        id: user_id,
        phone_number: phone.digits().to_string(),
        name: name.to_string(),
        email,
        password_hash,
        role: UserRole::User.to_string(),
        is_active: true,
        last_login: Some(Utc::now()),
    };

    let user = state.users.create_with_permissions(new_user, permission).await?;

    if state.config.require_verified_phone {
        if let Err(e) = state.verifications.remove(&phone).await {
            tracing::warn!(error = %e, "failed to clear used verification");
        }
    }

    let role = user.role();
    let token = state.sessions.issue(user.id, role)?;

    // Best effort, registration has already succeeded.
    if let Some(sms) = &state.sms {
        if let Err(e) = sms.send_sms(&phone, WELCOME_MESSAGE).await {
            tracing::warn!(user_id = %user.id, error = %e, "failed to send welcome SMS");
        }
    }

    record_auth_event("register", "created");
    tracing::info!(user_id = %user.id, phone = %phone.masked(), "user registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            RegisterResponse {
                token,
                user: RegisteredUser {
                    user_id: user.id,
                    name: user.name,
                    email: user.email,
                    role,
                    phone_number: user.phone_number,
                },
            },
            "Registration successful",
        )),
    ))
}
