//! Authentication route handlers.
//!
//! Accounts live in the gym backend. A successful login or OTP verification
//! stores a [`CurrentUser`] in a freshly rotated session and folds the guest
//! cart into the member's cart.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use ironhouse_core::{Email, UserId, UserRole};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, PendingCheckout, PendingPlanCheckout, session_keys};
use crate::services::{AuthService, CartService, CheckoutService, MergeOutcome, SignupInput};
use crate::state::AppState;

// =============================================================================
// Request and response types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

/// Generic acknowledgement.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub email: Email,
    pub message: &'static str,
}

/// The logged-in member, without the token.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: UserRole,
}

impl From<&CurrentUser> for MeResponse {
    fn from(user: &CurrentUser) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: MeResponse,
    /// Guest cart lines moved into the member's cart.
    pub merged_items: usize,
    pub skipped_items: usize,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /api/auth/signup`
#[instrument(skip(state, input))]
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupInput>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    let email = AuthService::new(state.backend()).signup(&input).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            email,
            message: "Check your email for a verification code",
        }),
    ))
}

/// `POST /api/auth/verify-otp` - completes signup and logs the member in.
#[instrument(skip(state, session, body))]
pub async fn verify_otp(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<LoginResponse>> {
    let user = AuthService::new(state.backend())
        .verify_otp(&body.email, &body.otp)
        .await?;
    Ok(Json(establish_session(&state, &session, user).await?))
}

/// `POST /api/auth/resend-otp`
#[instrument(skip(state, body))]
pub async fn resend_otp(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> Result<Json<Message>> {
    AuthService::new(state.backend())
        .resend_otp(&body.email)
        .await?;
    Ok(Json(Message {
        message: "A new code is on its way",
    }))
}

/// `POST /api/auth/login`
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let user = AuthService::new(state.backend())
        .login(&body.email, &body.password)
        .await?;
    Ok(Json(establish_session(&state, &session, user).await?))
}

/// `POST /api/auth/logout`
///
/// Releases stock held by an unpaid checkout before the session is dropped.
#[instrument(skip(state, session, user))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<StatusCode> {
    if let Some(user) = user {
        if let Some(pending) = session
            .get::<PendingCheckout>(session_keys::PENDING_CHECKOUT)
            .await?
        {
            CheckoutService::new(state.backend(), &state.config().checkout)
                .cancel(&user, &pending)
                .await;
        }
        if let Some(plan) = session
            .get::<PendingPlanCheckout>(session_keys::PENDING_PLAN_CHECKOUT)
            .await?
            && let Some(payment_id) = plan.paid_payment_id
        {
            tracing::error!(
                user_id = %user.id,
                plan_id = %plan.plan_id,
                payment_id = %payment_id,
                "Logged out with a paid membership not yet activated"
            );
        }
        tracing::info!(user_id = %user.id, "Member logged out");
    }

    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/auth/forgot-password`
///
/// Always answers the same way so the endpoint cannot be used to probe for
/// accounts.
#[instrument(skip(state, body))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> Result<(StatusCode, Json<Message>)> {
    AuthService::new(state.backend())
        .forgot_password(&body.email)
        .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(Message {
            message: "If an account exists for that email, a reset code has been sent",
        }),
    ))
}

/// `POST /api/auth/reset-password`
#[instrument(skip(state, body))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<Message>> {
    AuthService::new(state.backend())
        .reset_password(&body.email, &body.otp, &body.new_password)
        .await?;
    Ok(Json(Message {
        message: "Password updated, you can now log in",
    }))
}

/// `GET /api/auth/me`
pub async fn me(RequireAuth(user): RequireAuth) -> Json<MeResponse> {
    Json(MeResponse::from(&user))
}

/// Store the member in a rotated session, merge the guest cart and tag Sentry.
async fn establish_session(
    state: &AppState,
    session: &Session,
    user: CurrentUser,
) -> Result<LoginResponse> {
    set_current_user(session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    let cart = CartService::new(state.backend(), session, state.config().checkout.currency);
    let outcome = match cart.merge_guest_into_user(&user).await {
        Ok(outcome) => outcome,
        Err(e) => {
            // The login itself succeeded; a stale guest cart is not worth failing it.
            tracing::warn!(user_id = %user.id, error = %e, "Guest cart merge failed");
            MergeOutcome::default()
        }
    };

    tracing::info!(user_id = %user.id, role = %user.role, "Member logged in");
    Ok(LoginResponse {
        user: MeResponse::from(&user),
        merged_items: outcome.merged,
        skipped_items: outcome.skipped,
    })
}
