//! Session middleware configuration.
//!
//! The server runs on the `PostgreSQL` store; tests pass `MemoryStore`.

use tower_sessions::cookie::{Key, SameSite, time::Duration};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "ih_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer over `store` with a signed cookie.
#[must_use]
pub fn create_session_layer<S: SessionStore + Clone>(
    store: S,
    key: Key,
    secure: bool,
) -> SessionManagerLayer<S, SignedCookie> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(SESSION_EXPIRY_SECONDS)))
        .with_secure(secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key)
}
