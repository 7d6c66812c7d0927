use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hope_shared::errors::{AppError, AppResult, ErrorCode};
use hope_shared::extract::JsonBody;
use hope_shared::middleware::record_auth_event;
use hope_shared::types::auth::UserRole;
use hope_shared::types::ApiResponse;

use crate::routes::non_empty;
use crate::services::auth_service;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
    pub role: UserRole,
}

fn invalid_credentials() -> AppError {
    record_auth_event("login", "rejected");
    AppError::new(ErrorCode::InvalidCredentials, "Invalid credentials")
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let (Some(email), Some(password)) = (
        non_empty(&req.email),
        req.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::validation("Email and password are required"));
    };
    let email = email.to_lowercase();

    // Unknown email, wrong password and disabled account all look the same.
    let Some(user) = state.users.find_by_email(&email).await? else {
        tracing::debug!("login for unknown email");
        auth_service::verify_against_dummy(password);
        return Err(invalid_credentials());
    };

    if !auth_service::verify_password(password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "password mismatch");
        return Err(invalid_credentials());
    }
    if !user.is_active {
        tracing::info!(user_id = %user.id, "login attempt on inactive account");
        return Err(invalid_credentials());
    }

    state.users.record_login(user.id).await?;

    let role = user.role();
    let token = state.sessions.issue(user.id, role)?;

    record_auth_event("login", "success");
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(ApiResponse::ok(LoginResponse {
        token,
        user_id: user.id,
        role,
    })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::store::UserStore;
    use crate::testing::{TestApp, TEST_PASSWORD};

    #[tokio::test]
    async fn valid_credentials_issue_token() {
        let app = TestApp::new();
        let user_id = app.register("9876543210", "a@b.com").await;

        let (status, body) = app
            .post("/auth/login", json!({ "email": "A@B.com", "password": TEST_PASSWORD }))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["userId"], user_id.to_string());
        assert_eq!(body["role"], "user");

        let claims = app.state.sessions.verify(body["token"].as_str().unwrap()).unwrap();
        assert_eq!(claims.sub, user_id);
    }

    #[tokio::test]
    async fn login_updates_last_login() {
        let app = TestApp::new();
        let user_id = app.register("9876543210", "a@b.com").await;
        let before = app.users.find_by_id(user_id).await.unwrap().unwrap().last_login;

        app.post("/auth/login", json!({ "email": "a@b.com", "password": TEST_PASSWORD }))
            .await;

        let after = app.users.find_by_id(user_id).await.unwrap().unwrap().last_login;
        assert!(after.is_some());
        assert!(after >= before);
    }

    #[tokio::test]
    async fn wrong_password_is_400_not_401() {
        let app = TestApp::new();
        app.register("9876543210", "a@b.com").await;

        let (status, body) = app
            .post("/auth/login", json!({ "email": "a@b.com", "password": "wrong" }))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid credentials", "success": false }));
    }

    #[tokio::test]
    async fn unknown_email_looks_like_wrong_password() {
        let app = TestApp::new();
        let (status, body) = app
            .post("/auth/login", json!({ "email": "nobody@b.com", "password": "whatever1" }))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid credentials");
    }

    #[tokio::test]
    async fn inactive_account_cannot_log_in() {
        let app = TestApp::new();
        let user_id = app.register("9876543210", "a@b.com").await;
        app.users.set_active(user_id, false);

        let (status, body) = app
            .post("/auth/login", json!({ "email": "a@b.com", "password": TEST_PASSWORD }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid credentials");
    }

    #[tokio::test]
    async fn missing_fields_rejected() {
        let app = TestApp::new();
        let (status, body) = app.post("/auth/login", json!({ "email": "a@b.com" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email and password are required");
    }
}
