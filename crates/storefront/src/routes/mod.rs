//! HTTP route handlers for storefront.
//!
//! Everything is JSON. Errors come back as `{"error": "..."}`.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Readiness (session database)
//!
//! # Catalog
//! GET  /api/products                    - ?category=&q=&sort=price_asc|price_desc|name
//! GET  /api/products/{id}
//! GET  /api/plans
//! GET  /api/plans/{id}
//! GET  /api/trainers
//! GET  /api/trainers/{id}
//! GET  /api/content/home
//! GET  /api/content/resources/{title}
//!
//! # Cart (guest or member)
//! GET    /api/cart
//! DELETE /api/cart
//! POST   /api/cart/items
//! PATCH  /api/cart/items/{product_id}
//! DELETE /api/cart/items/{product_id}
//! GET    /api/cart/count
//! POST   /api/cart/discount             - Preview totals with a code
//!
//! # Auth (rate limited)
//! POST /api/auth/signup | verify-otp | resend-otp | login | logout
//! POST /api/auth/forgot-password | reset-password
//! GET  /api/auth/me
//!
//! # Checkout (requires auth)
//! POST /api/checkout                    - Lock stock, open payment order
//! POST /api/checkout/confirm
//! POST /api/checkout/cancel
//! POST /api/checkout/plan
//! POST /api/checkout/plan/confirm
//!
//! # Account (requires auth)
//! GET    /api/account/orders
//! GET    /api/account/membership
//! GET    /api/account/bookings
//! POST   /api/account/bookings
//! DELETE /api/account/bookings/{id}
//!
//! # Admin (requires admin role)
//! /api/admin/...                        - See `admin::admin_routes`
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod products;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes(rate_limit: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/signup", post(auth::signup))
        .route("/verify-otp", post(auth::verify_otp))
        .route("/resend-otp", post(auth::resend_otp))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password));

    let router = if rate_limit {
        router.layer(auth_rate_limiter())
    } else {
        router
    };

    // Logout and `me` are cheap and must never be throttled.
    router
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(products::index))
        .route("/api/products/{id}", get(products::show))
        .route("/api/plans", get(catalog::plans))
        .route("/api/plans/{id}", get(catalog::plan))
        .route("/api/trainers", get(catalog::trainers))
        .route("/api/trainers/{id}", get(catalog::trainer))
        .route("/api/content/home", get(catalog::home))
        .route("/api/content/resources/{title}", get(catalog::resource))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            patch(cart::update).delete(cart::remove),
        )
        .route("/count", get(cart::count))
        .route("/discount", post(cart::preview_discount))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::start))
        .route("/confirm", post(checkout::confirm))
        .route("/cancel", post(checkout::cancel))
        .route("/plan", post(checkout::start_plan))
        .route("/plan/confirm", post(checkout::confirm_plan))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(account::orders))
        .route("/membership", get(account::membership))
        .route(
            "/bookings",
            get(account::bookings).post(account::create_booking),
        )
        .route(
            "/bookings/{id}",
            axum::routing::delete(account::cancel_booking),
        )
}

/// Create all routes for the storefront.
pub fn routes(rate_limit_auth: bool) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(catalog_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/auth", auth_routes(rate_limit_auth))
        .nest("/api/checkout", checkout_routes())
        .nest("/api/account", account_routes())
        .nest("/api/admin", admin::admin_routes())
}
