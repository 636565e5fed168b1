//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Responses are JSON: `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ironhouse_core::booking::BookingError;
use ironhouse_core::cart::CartError;
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;
use crate::services::auth::AuthError;
use crate::services::booking::BookingServiceError;
use crate::services::cart::CartServiceError;
use crate::services::checkout::CheckoutError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Gym backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartServiceError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Booking operation failed.
    #[error("Booking error: {0}")]
    Booking(#[from] BookingServiceError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but lacks the role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

const INTERNAL_MESSAGE: &str = "Internal server error";
const UPSTREAM_MESSAGE: &str = "External service error";

impl AppError {
    /// Status code and client-safe message.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Backend(err) => backend_response(err),
            Self::Checkout(err) => checkout_response(err),
            Self::Cart(err) => match err {
                CartServiceError::Cart(e) => cart_response(e),
                CartServiceError::Unavailable(_) => (StatusCode::CONFLICT, err.to_string()),
                CartServiceError::Backend(e) => backend_response(e),
                CartServiceError::Session(_) => internal(),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
                }
                AuthError::UserAlreadyExists => (
                    StatusCode::CONFLICT,
                    "An account with this email already exists".to_string(),
                ),
                AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                AuthError::InvalidEmail(_) => {
                    (StatusCode::BAD_REQUEST, "Invalid email address".to_string())
                }
                AuthError::InvalidOtp(_) | AuthError::CodeRejected(_) => (
                    StatusCode::BAD_REQUEST,
                    "Invalid or expired code".to_string(),
                ),
                AuthError::InvalidName | AuthError::InvalidPhone => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                AuthError::Backend(e) => backend_response(e),
            },
            Self::Booking(err) => match err {
                BookingServiceError::Slot(BookingError::Overlaps { .. }) => (
                    StatusCode::CONFLICT,
                    "You already have a session at that time".to_string(),
                ),
                BookingServiceError::Slot(_) | BookingServiceError::NotesTooLong => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                BookingServiceError::TrainerNotFound(_) | BookingServiceError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, err.to_string())
                }
                BookingServiceError::NotCancellable => (StatusCode::CONFLICT, err.to_string()),
                BookingServiceError::Backend(e) => backend_response(e),
            },
            Self::Session(_) | Self::Internal(_) => internal(),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::RateLimited => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
        }
    }
}

fn internal() -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
}

fn backend_response(err: &BackendError) -> (StatusCode, String) {
    let status = match err {
        BackendError::NotFound(_) => StatusCode::NOT_FOUND,
        BackendError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        BackendError::Conflict(_) => StatusCode::CONFLICT,
        BackendError::Rejected(_) => StatusCode::BAD_REQUEST,
        BackendError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        BackendError::Http(_)
        | BackendError::Url
        | BackendError::Status { .. }
        | BackendError::Parse(_) => StatusCode::BAD_GATEWAY,
    };
    let message = match err {
        BackendError::RateLimited(_) => "Too many requests, please try again shortly".to_string(),
        _ => err
            .user_message()
            .map_or_else(|| UPSTREAM_MESSAGE.to_string(), str::to_string),
    };
    (status, message)
}

fn cart_response(err: &CartError) -> (StatusCode, String) {
    match err {
        CartError::LineNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CartError::Price(_) => internal(),
        CartError::ZeroQuantity | CartError::ExceedsStock { .. } | CartError::ExceedsLimit { .. } => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
    }
}

fn checkout_response(err: &CheckoutError) -> (StatusCode, String) {
    match err {
        CheckoutError::EmptyCart
        | CheckoutError::NothingToCharge
        | CheckoutError::OrderMismatch
        | CheckoutError::Discount(_)
        | CheckoutError::Membership(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::OutOfStock { .. }
        | CheckoutError::Unavailable { .. }
        | CheckoutError::PlanUnavailable(_)
        | CheckoutError::LockFailed { .. }
        | CheckoutError::NoPendingCheckout
        | CheckoutError::SubscriptionPending => (StatusCode::CONFLICT, err.to_string()),
        CheckoutError::CheckoutExpired => (StatusCode::GONE, err.to_string()),
        CheckoutError::PaymentRejected(_) => (StatusCode::PAYMENT_REQUIRED, err.to_string()),
        CheckoutError::Cart(e) => cart_response(e),
        CheckoutError::Price(_) => internal(),
        CheckoutError::AmountMismatch { .. } => {
            (StatusCode::BAD_GATEWAY, UPSTREAM_MESSAGE.to_string())
        }
        CheckoutError::Backend(e) => backend_response(e),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a member action.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
