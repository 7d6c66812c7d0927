pub mod health;
pub mod login;
pub mod me;
pub mod register;
pub mod request_otp;
pub mod reset_password;
pub mod verify_otp;

/// Trimmed value of an optional request field, `None` when absent or blank.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
