use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Auth errors
/// - E2xxx: OTP errors
///
/// Codes are written to the logs only. Clients see the HTTP status and the
/// human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    BadRequest,
    UpstreamError,

    // Auth (E1xxx)
    InvalidCredentials,
    UserAlreadyExists,
    UserNotFound,
    Unauthorized,
    TokenExpired,
    TokenInvalid,
    PasswordTooWeak,

    // OTP (E2xxx)
    OtpRejected,
    OtpInvalidOrExpired,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::BadRequest => "E0004",
            Self::UpstreamError => "E0005",

            // Auth
            Self::InvalidCredentials => "E1001",
            Self::UserAlreadyExists => "E1002",
            Self::UserNotFound => "E1003",
            Self::Unauthorized => "E1004",
            Self::TokenExpired => "E1005",
            Self::TokenInvalid => "E1006",
            Self::PasswordTooWeak => "E1007",

            // OTP
            Self::OtpRejected => "E2001",
            Self::OtpInvalidOrExpired => "E2002",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError | Self::UpstreamError => StatusCode::INTERNAL_SERVER_ERROR,
            // Bad credentials and duplicate accounts are plain 400s, 401 is
            // reserved for session tokens.
            Self::ValidationError | Self::BadRequest | Self::PasswordTooWeak
            | Self::InvalidCredentials | Self::UserAlreadyExists
            | Self::OtpRejected | Self::OtpInvalidOrExpired => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::TokenExpired | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        provider_status: Option<String>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("cache error: {0}")]
    Cache(#[from] redis::RedisError),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            provider_status: None,
        }
    }

    /// Attach the status string reported by an external provider, which is
    /// echoed to the client next to the message.
    pub fn with_provider_status(code: ErrorCode, message: impl Into<String>, status: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            provider_status: Some(status.into()),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Known { code, .. } => *code,
            AppError::Internal(_) | AppError::Cache(_) => ErrorCode::InternalError,
            AppError::Database(diesel::result::Error::NotFound) => ErrorCode::NotFound,
            AppError::Database(_) => ErrorCode::InternalError,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, provider_status } => {
                if code.status_code().is_server_error() {
                    tracing::error!(code = code.code(), error = %message, "request failed");
                } else {
                    tracing::debug!(code = code.code(), error = %message, "request rejected");
                }
                // Upstream messages come from the provider and are meant for
                // the client; internal ones may carry infrastructure detail.
                let mut resp = if *code == ErrorCode::InternalError {
                    ApiErrorResponse::new("Internal server error")
                } else {
                    ApiErrorResponse::new(message)
                };
                if let Some(s) = provider_status {
                    resp = resp.with_status(s.clone());
                }
                (code.status_code(), resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("Internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("Resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("Internal server error"),
                    ),
                }
            }
            AppError::Cache(err) => {
                tracing::error!(error = %err, "cache error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("Internal server error"),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
