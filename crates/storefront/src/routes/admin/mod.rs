//! Admin back-office API. Every handler takes [`RequireAdmin`].

pub mod catalog;
pub mod discounts;
pub mod resources;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use tracing::instrument;

use crate::backend::Order;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::{DashboardService, DashboardSummary};
use crate::state::AppState;

/// `GET /api/admin/dashboard`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<DashboardSummary>> {
    let summary = DashboardService::new(state.backend(), state.config().checkout.currency)
        .summary(&admin.token)
        .await?;
    Ok(Json(summary))
}

/// `GET /api/admin/orders` - newest first.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<Order>>> {
    let mut orders = state.backend().get_all_orders(&admin.token).await?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(orders))
}

/// Create the admin routes router (mounted at `/api/admin`).
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/orders", get(orders))
        .route("/discounts", get(discounts::index).post(discounts::create))
        .route(
            "/discounts/{id}",
            put(discounts::update).delete(discounts::delete),
        )
        .route("/resources", get(resources::index).post(resources::create))
        .route(
            "/resources/{id}",
            put(resources::update).delete(resources::delete),
        )
        .route("/products", post(catalog::create_product))
        .route(
            "/products/{id}",
            put(catalog::update_product).delete(catalog::delete_product),
        )
        .route("/plans", post(catalog::create_plan))
        .route(
            "/plans/{id}",
            put(catalog::update_plan).delete(catalog::delete_plan),
        )
}
