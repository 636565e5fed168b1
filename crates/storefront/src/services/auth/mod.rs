//! Authentication service.
//!
//! Accounts live in the gym backend, which also generates and emails OTPs.
//! This service validates input before anything reaches the backend and
//! turns successful logins into a [`CurrentUser`].

mod error;

pub use error::AuthError;

use ironhouse_core::{Email, OtpCode};
use tracing::instrument;

use crate::backend::{
    BackendError, EmailRequest, GymApiClient, LoginRequest, ResetPasswordRequest, SignupRequest,
    VerifyOtpRequest,
};
use crate::models::CurrentUser;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum password length.
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_NAME_LENGTH: usize = 100;

/// Signup form.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SignupInput {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Authentication service.
pub struct AuthService<'a> {
    backend: &'a GymApiClient,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(backend: &'a GymApiClient) -> Self {
        Self { backend }
    }

    /// Register a new account. The backend emails a verification code.
    ///
    /// Returns the normalized email the code was sent to.
    ///
    /// # Errors
    ///
    /// Returns a validation error, or `AuthError::UserAlreadyExists` if the
    /// email is taken.
    #[instrument(skip(self, input))]
    pub async fn signup(&self, input: &SignupInput) -> Result<Email, AuthError> {
        let name = validate_name(&input.name)?;
        let email = Email::parse(&input.email)?;
        validate_password(&input.password)?;
        let phone = input
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(validate_phone)
            .transpose()?;

        let request = SignupRequest {
            name,
            email: email.as_str(),
            password: &input.password,
            phone,
        };
        self.backend.signup(&request).await.map_err(|e| match e {
            BackendError::Conflict(_) => AuthError::UserAlreadyExists,
            other => other.into(),
        })?;

        tracing::info!(email_domain = %email.domain(), "Signup started, OTP sent");
        Ok(email)
    }

    /// Verify the signup OTP and log the new account in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CodeRejected` for wrong or expired codes.
    #[instrument(skip(self, email, otp))]
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<CurrentUser, AuthError> {
        let email = Email::parse(email)?;
        let otp = OtpCode::parse(otp)?;

        let auth = self
            .backend
            .verify_otp(&VerifyOtpRequest {
                email: email.as_str(),
                otp: otp.as_str(),
            })
            .await
            .map_err(code_error)?;

        Ok(CurrentUser::from_auth(auth)?)
    }

    /// # Errors
    ///
    /// Returns an error if the email is invalid or the backend fails.
    #[instrument(skip(self, email))]
    pub async fn resend_otp(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        self.backend
            .resend_otp(&EmailRequest {
                email: email.as_str(),
            })
            .await
            .map_err(code_error)?;
        Ok(())
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<CurrentUser, AuthError> {
        let email = Email::parse(email)?;
        if password.is_empty() || password.chars().count() > MAX_PASSWORD_LENGTH {
            return Err(AuthError::InvalidCredentials);
        }

        let auth = self
            .backend
            .login(&LoginRequest {
                email: email.as_str(),
                password,
            })
            .await
            .map_err(|e| match e {
                BackendError::Unauthorized(_) | BackendError::NotFound(_) => {
                    AuthError::InvalidCredentials
                }
                other => other.into(),
            })?;

        Ok(CurrentUser::from_auth(auth)?)
    }

    /// Request a password reset code.
    ///
    /// Unknown emails succeed silently so the endpoint cannot be used to
    /// probe for accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is invalid or the backend fails.
    #[instrument(skip(self, email))]
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        match self
            .backend
            .forgot_password(&EmailRequest {
                email: email.as_str(),
            })
            .await
        {
            Ok(_) => Ok(()),
            Err(BackendError::NotFound(_)) => {
                tracing::debug!("Password reset requested for unknown email");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Set a new password using a reset code.
    ///
    /// # Errors
    ///
    /// Returns a validation error or `AuthError::CodeRejected`.
    #[instrument(skip(self, email, otp, new_password))]
    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        let otp = OtpCode::parse(otp)?;
        validate_password(new_password)?;

        self.backend
            .reset_password(&ResetPasswordRequest {
                email: email.as_str(),
                otp: otp.as_str(),
                new_password,
            })
            .await
            .map_err(code_error)?;
        Ok(())
    }
}

/// OTP endpoints answer bad codes with 400 or 401.
fn code_error(e: BackendError) -> AuthError {
    match e {
        BackendError::Rejected(msg) | BackendError::Unauthorized(msg) => {
            AuthError::CodeRejected(msg)
        }
        other => other.into(),
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    if !password.chars().any(char::is_alphabetic) || !password.chars().any(|c| c.is_ascii_digit())
    {
        return Err(AuthError::WeakPassword(
            "password must contain a letter and a digit".to_string(),
        ));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<&str, AuthError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err(AuthError::InvalidName);
    }
    Ok(name)
}

/// Accepts digits with an optional leading `+` and spaces or dashes.
fn validate_phone(phone: &str) -> Result<&str, AuthError> {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    let well_formed = phone
        .char_indices()
        .all(|(i, c)| c.is_ascii_digit() || c == ' ' || c == '-' || (i == 0 && c == '+'));
    if !well_formed || !(7..=15).contains(&digits) {
        return Err(AuthError::InvalidPhone);
    }
    Ok(phone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password() {
        assert!(validate_password("lift2024").is_ok());
        assert!(matches!(
            validate_password("short1"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            validate_password("nodigitshere"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            validate_password("1234567890"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password(&format!("a1{}", "x".repeat(127))).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Ravi Kumar ").ok(), Some("Ravi Kumar"));
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"n".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+91 98765-43210").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("98765+43210").is_err());
        assert!(validate_phone("call me").is_err());
    }

    #[test]
    fn test_code_error_mapping() {
        assert!(matches!(
            code_error(BackendError::Rejected("Invalid OTP".into())),
            AuthError::CodeRejected(m) if m == "Invalid OTP"
        ));
        assert!(matches!(
            code_error(BackendError::RateLimited(30)),
            AuthError::Backend(BackendError::RateLimited(30))
        ));
    }
}
