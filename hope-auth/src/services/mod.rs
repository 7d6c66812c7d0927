pub mod auth_service;
pub mod otp;
pub mod phone;
pub mod verification;
