//! Ironhouse storefront library.
//!
//! A JSON backend-for-frontend for the gym's shop, memberships and trainer
//! bookings. It owns sessions, the guest cart and checkout orchestration, and
//! talks to the gym REST backend for everything else.
//!
//! The router is built here so the binary and the integration tests share it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, extract::Request};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;

use crate::middleware::{
    create_session_layer, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Build the full application over the given session store.
///
/// The server passes the `PostgreSQL` store; tests pass `MemoryStore`.
pub fn app<S: SessionStore + Clone>(state: AppState, store: S) -> Router {
    let session_layer = create_session_layer(
        store,
        state.session_key().clone(),
        state.config().is_secure(),
    );
    let rate_limit_auth = state.config().rate_limit_auth;

    Router::new()
        .merge(routes::routes(rate_limit_auth))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
