//! Account endpoints. OTP generation and delivery happen in the backend.

use reqwest::Method;
use tracing::instrument;

use super::types::{
    AuthResponse, EmailRequest, LoginRequest, MessageResponse, ResetPasswordRequest,
    SignupRequest, VerifyOtpRequest,
};
use super::{BackendError, GymApiClient};

impl GymApiClient {
    /// Register an account; the backend emails a verification OTP.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the email is taken.
    #[instrument(skip(self, request))]
    pub async fn signup(&self, request: &SignupRequest<'_>) -> Result<MessageResponse, BackendError> {
        self.send_json(Method::POST, &["api", "auth", "signup"], None, request)
            .await
    }

    /// # Errors
    ///
    /// Returns `Rejected` or `Unauthorized` for a wrong or expired code.
    #[instrument(skip(self, request))]
    pub async fn verify_otp(&self, request: &VerifyOtpRequest<'_>) -> Result<AuthResponse, BackendError> {
        self.send_json(Method::POST, &["api", "auth", "verify-otp"], None, request)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, request))]
    pub async fn resend_otp(&self, request: &EmailRequest<'_>) -> Result<MessageResponse, BackendError> {
        self.send_json(Method::POST, &["api", "auth", "resend-otp"], None, request)
            .await
    }

    /// # Errors
    ///
    /// Returns `Unauthorized` for bad credentials.
    #[instrument(skip(self, request))]
    pub async fn login(&self, request: &LoginRequest<'_>) -> Result<AuthResponse, BackendError> {
        self.send_json(Method::POST, &["api", "auth", "login"], None, request)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, request))]
    pub async fn forgot_password(
        &self,
        request: &EmailRequest<'_>,
    ) -> Result<MessageResponse, BackendError> {
        self.send_json(Method::POST, &["api", "auth", "forgot-password"], None, request)
            .await
    }

    /// # Errors
    ///
    /// Returns `Rejected` for a wrong or expired code.
    #[instrument(skip(self, request))]
    pub async fn reset_password(
        &self,
        request: &ResetPasswordRequest<'_>,
    ) -> Result<MessageResponse, BackendError> {
        self.send_json(Method::POST, &["api", "auth", "reset-password"], None, request)
            .await
    }
}
