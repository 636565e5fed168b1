//! Cart route handlers.
//!
//! Guests and members share these endpoints; [`CartService`] decides which
//! cart is touched.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use ironhouse_core::cart::{Cart, CartLine};
use ironhouse_core::discount::{DiscountCode, Totals};
use ironhouse_core::{Price, ProductId};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::services::{CartService, CheckoutService};
use crate::state::AppState;

const fn default_quantity() -> u32 {
    1
}

/// Add-to-cart body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// Quantity update body.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

/// Discount preview body.
#[derive(Debug, Deserialize)]
pub struct DiscountRequest {
    pub code: String,
}

/// Cart as returned to the UI.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub item_count: u32,
    pub subtotal: Price,
}

#[derive(Debug, Serialize)]
pub struct CountView {
    pub count: u32,
}

impl CartView {
    fn build(cart: &Cart, state: &AppState) -> Result<Self> {
        let subtotal = cart
            .subtotal(state.config().checkout.currency)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(Self {
            lines: cart.lines().to_vec(),
            item_count: cart.item_count(),
            subtotal,
        })
    }
}

fn service<'a>(state: &'a AppState, session: &'a Session) -> CartService<'a> {
    CartService::new(state.backend(), session, state.config().checkout.currency)
}

/// `GET /api/cart`
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<CartView>> {
    let cart = service(&state, &session).view(user.as_ref()).await?;
    Ok(Json(CartView::build(&cart, &state)?))
}

/// `POST /api/cart/items`
#[instrument(skip(state, session, user), fields(product_id = %body.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(body): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartView>)> {
    let cart = service(&state, &session)
        .add(user.as_ref(), &body.product_id, body.quantity)
        .await?;
    add_breadcrumb("cart", "Added item", Some(&[("product_id", body.product_id.as_str())]));
    Ok((StatusCode::CREATED, Json(CartView::build(&cart, &state)?)))
}

/// `PATCH /api/cart/items/{product_id}` - quantity 0 removes the line.
#[instrument(skip(state, session, user, body))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(product_id): Path<ProductId>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let cart = service(&state, &session)
        .set_quantity(user.as_ref(), &product_id, body.quantity)
        .await?;
    Ok(Json(CartView::build(&cart, &state)?))
}

/// `DELETE /api/cart/items/{product_id}`
#[instrument(skip(state, session, user))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let cart = service(&state, &session)
        .remove(user.as_ref(), &product_id)
        .await?;
    Ok(Json(CartView::build(&cart, &state)?))
}

/// `DELETE /api/cart`
#[instrument(skip(state, session, user))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<StatusCode> {
    service(&state, &session).clear(user.as_ref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/cart/count`
#[instrument(skip(state, session, user))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<CountView>> {
    let count = service(&state, &session).count(user.as_ref()).await?;
    Ok(Json(CountView { count }))
}

/// `POST /api/cart/discount` - preview totals with a code.
#[instrument(skip(state, session, user, body))]
pub async fn preview_discount(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(body): Json<DiscountRequest>,
) -> Result<Json<Totals>> {
    let code = DiscountCode::parse(&body.code)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let cart = service(&state, &session).view(user.as_ref()).await?;
    let totals = CheckoutService::new(state.backend(), &state.config().checkout)
        .quote(
            &cart,
            Some(&code),
            user.as_ref().map(|u| &u.token),
            Utc::now(),
        )
        .await?;
    Ok(Json(totals))
}
