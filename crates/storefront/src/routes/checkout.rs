//! Checkout route handlers.
//!
//! The pending checkout lives in the session between `POST /api/checkout`
//! and the payment widget's callback. Starting a new checkout releases
//! whatever the previous one still holds.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use chrono::Utc;
use ironhouse_core::PlanId;
use ironhouse_core::discount::DiscountCode;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::Membership;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, PendingCheckout, PendingPlanCheckout, session_keys};
use crate::services::{
    CheckoutError, CheckoutService, ConfirmedOrder, PaymentConfirmation, PaymentIntent,
};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StartCheckoutRequest {
    #[serde(default)]
    pub discount_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StartPlanRequest {
    pub plan_id: PlanId,
}

fn service(state: &AppState) -> CheckoutService<'_> {
    CheckoutService::new(state.backend(), &state.config().checkout)
}

/// Release and forget a previous product checkout, if any.
async fn release_previous(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
) -> Result<()> {
    if let Some(previous) = session
        .remove::<PendingCheckout>(session_keys::PENDING_CHECKOUT)
        .await?
    {
        tracing::info!(order_id = %previous.payment_order_id, "Replacing abandoned checkout");
        service(state).cancel(user, &previous).await;
    }
    Ok(())
}

/// `POST /api/checkout` - lock stock and open a payment order.
#[instrument(skip(state, session, user, body), fields(user_id = %user.id))]
pub async fn start(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    body: Option<Json<StartCheckoutRequest>>,
) -> Result<Json<PaymentIntent>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let code = body
        .discount_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(DiscountCode::parse)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    release_previous(&state, &session, &user).await?;

    let (pending, intent) = service(&state)
        .start(&user, code.as_ref(), Utc::now())
        .await?;

    if let Err(e) = session
        .insert(session_keys::PENDING_CHECKOUT, &pending)
        .await
    {
        service(&state).cancel(&user, &pending).await;
        return Err(e.into());
    }

    add_breadcrumb(
        "checkout",
        "Checkout started",
        Some(&[("order_id", pending.payment_order_id.as_str())]),
    );
    Ok(Json(intent))
}

/// `POST /api/checkout/confirm` - payment widget success callback.
#[instrument(skip(state, session, user, payment), fields(user_id = %user.id))]
pub async fn confirm(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(payment): Json<PaymentConfirmation>,
) -> Result<Json<ConfirmedOrder>> {
    let pending = session
        .get::<PendingCheckout>(session_keys::PENDING_CHECKOUT)
        .await?
        .ok_or(CheckoutError::NoPendingCheckout)?;

    match service(&state)
        .confirm(&user, &pending, &payment, Utc::now())
        .await
    {
        Ok(order) => {
            session
                .remove::<PendingCheckout>(session_keys::PENDING_CHECKOUT)
                .await?;
            Ok(Json(order))
        }
        Err(e) => {
            if e.ends_checkout() {
                session
                    .remove::<PendingCheckout>(session_keys::PENDING_CHECKOUT)
                    .await?;
            }
            Err(e.into())
        }
    }
}

/// `POST /api/checkout/cancel` - widget dismissed. Idempotent.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn cancel(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<StatusCode> {
    release_previous(&state, &session, &user).await?;
    let plan = session
        .get::<PendingPlanCheckout>(session_keys::PENDING_PLAN_CHECKOUT)
        .await?;
    // A paid plan stays until its subscription goes through.
    if plan.is_some_and(|p| !p.is_paid()) {
        session
            .remove::<PendingPlanCheckout>(session_keys::PENDING_PLAN_CHECKOUT)
            .await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/checkout/plan` - open a payment order for a membership plan.
#[instrument(skip(state, session, user, body), fields(user_id = %user.id, plan_id = %body.plan_id))]
pub async fn start_plan(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(body): Json<StartPlanRequest>,
) -> Result<Json<PaymentIntent>> {
    if session
        .get::<PendingPlanCheckout>(session_keys::PENDING_PLAN_CHECKOUT)
        .await?
        .is_some_and(|p| p.is_paid())
    {
        return Err(CheckoutError::SubscriptionPending.into());
    }

    let (pending, intent) = service(&state)
        .start_plan(&user, &body.plan_id, Utc::now())
        .await?;
    session
        .insert(session_keys::PENDING_PLAN_CHECKOUT, &pending)
        .await?;
    Ok(Json(intent))
}

/// `POST /api/checkout/plan/confirm`
#[instrument(skip(state, session, user, payment), fields(user_id = %user.id))]
pub async fn confirm_plan(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(payment): Json<PaymentConfirmation>,
) -> Result<(StatusCode, Json<Membership>)> {
    let mut pending = session
        .get::<PendingPlanCheckout>(session_keys::PENDING_PLAN_CHECKOUT)
        .await?
        .ok_or(CheckoutError::NoPendingCheckout)?;
    let was_paid = pending.is_paid();

    match service(&state)
        .confirm_plan(&user, &mut pending, &payment, Utc::now())
        .await
    {
        Ok(membership) => {
            session
                .remove::<PendingPlanCheckout>(session_keys::PENDING_PLAN_CHECKOUT)
                .await?;
            Ok((StatusCode::CREATED, Json(membership)))
        }
        Err(e) => {
            if e.ends_checkout() {
                session
                    .remove::<PendingPlanCheckout>(session_keys::PENDING_PLAN_CHECKOUT)
                    .await?;
            } else if pending.is_paid() && !was_paid {
                session
                    .insert(session_keys::PENDING_PLAN_CHECKOUT, &pending)
                    .await?;
            }
            Err(e.into())
        }
    }
}
