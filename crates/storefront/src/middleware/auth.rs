//! Authentication extractors.
//!
//! The logged-in member lives in the session under
//! [`session_keys::CURRENT_USER`]. Rejections are JSON so the UI can tell an
//! expired login (401) from a missing role (403).

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a logged-in member.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Orders for {}", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a logged-in admin.
pub struct RequireAdmin(pub CurrentUser);

/// Why an auth extractor refused the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No session or not logged in.
    Unauthorized,
    /// Logged in without the required role.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Please log in to continue"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Admin access required"),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    match session.get::<CurrentUser>(session_keys::CURRENT_USER).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read current user from session");
            None
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts)
            .await
            .map(Self)
            .ok_or(AuthRejection::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await
            .ok_or(AuthRejection::Unauthorized)?;
        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Non-admin hit admin route");
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current member.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

/// Log a member in: rotate the session ID, then store the member.
///
/// Other session data (the guest cart) survives the rotation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Log out: drop everything in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be flushed.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
