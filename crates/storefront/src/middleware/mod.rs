//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID
//! 4. Security headers
//! 5. Session layer (tower-sessions, signed cookie)
//! 6. Rate limiting on auth routes (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AuthRejection, OptionalAuth, RequireAdmin, RequireAuth, clear_current_user, set_current_user,
};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
