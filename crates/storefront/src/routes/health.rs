//! Liveness and readiness probes.

use axum::{extract::State, http::StatusCode};

use crate::db;
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 when the session database is unreachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if db::is_ready(state.pool()).await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
