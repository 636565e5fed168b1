//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::ExposeSecret;
use sha2::{Digest, Sha512};
use sqlx::PgPool;
use tower_sessions::cookie::Key;

use crate::backend::{BackendError, GymApiClient};
use crate::config::StorefrontConfig;

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("gym backend client: {0}")]
    Backend(#[from] BackendError),
    #[error("session signing key: {0}")]
    SessionKey(String),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the backend client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    backend: GymApiClient,
    session_key: Key,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let backend = GymApiClient::new(&config.gym_api)?;
        let session_key = derive_session_key(config.session_secret.expose_secret())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                backend,
                session_key,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the gym backend client.
    #[must_use]
    pub fn backend(&self) -> &GymApiClient {
        &self.inner.backend
    }

    /// Key used to sign the session cookie.
    #[must_use]
    pub fn session_key(&self) -> &Key {
        &self.inner.session_key
    }
}

/// Stretch the configured secret to the 64 bytes cookie signing needs.
fn derive_session_key(secret: &str) -> Result<Key, StateError> {
    let digest = Sha512::digest(secret.as_bytes());
    Key::try_from(digest.as_slice()).map_err(|e| StateError::SessionKey(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_is_deterministic() {
        let a = derive_session_key("k8#Lp2$vQ9!mZ4@xR7&nW3^bT6*yH1%c").unwrap();
        let b = derive_session_key("k8#Lp2$vQ9!mZ4@xR7&nW3^bT6*yH1%c").unwrap();
        let c = derive_session_key("another-secret-value-with-entropy-42").unwrap();
        assert_eq!(a.master(), b.master());
        assert_ne!(a.master(), c.master());
    }
}
