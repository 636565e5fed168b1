//! Authentication error types.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] ironhouse_core::EmailError),

    /// OTP is not six digits.
    #[error("invalid code: {0}")]
    InvalidOtp(#[from] ironhouse_core::OtpError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Name missing or too long.
    #[error("invalid name")]
    InvalidName,

    /// Phone number malformed.
    #[error("invalid phone number")]
    InvalidPhone,

    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Email already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Backend refused an OTP or reset request.
    #[error("code rejected: {0}")]
    CodeRejected(String),

    /// Gym backend error.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}
