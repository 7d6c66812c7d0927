use axum::extract::FromRequest;

use crate::errors::AppError;

/// `axum::Json` with the rejection routed through [`AppError`], so malformed
/// bodies get the same `{"success": false, "error": ..}` shape as every other
/// failure.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
