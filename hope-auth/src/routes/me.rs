use axum::extract::State;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use hope_shared::errors::{AppError, AppResult, ErrorCode};
use hope_shared::types::auth::{AuthUser, UserRole};
use hope_shared::types::ApiResponse;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: CurrentUser,
}

pub async fn me(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<MeResponse>>> {
    let record = state
        .users
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "User not found"))?;

    let role = record.role();
    Ok(Json(ApiResponse::ok(MeResponse {
        user: CurrentUser {
            user_id: record.id,
            name: record.name,
            role,
            email: record.email,
        },
    })))
}
