//! Member account route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use ironhouse_core::membership::MembershipPeriod;
use ironhouse_core::{BookingId, MembershipStatus, PlanId};
use serde::Serialize;
use tracing::instrument;

use crate::backend::{Booking, Membership, Order};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::{BookingInput, BookingService};
use crate::state::AppState;

/// One membership with its status right now.
#[derive(Debug, Clone, Serialize)]
pub struct MembershipView {
    pub plan_id: PlanId,
    pub plan_name: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: MembershipStatus,
    pub days_remaining: i64,
}

#[derive(Debug, Serialize)]
pub struct MembershipSummary {
    /// The membership covering today, if any.
    pub active: Option<MembershipView>,
    /// Every membership, latest first.
    pub history: Vec<MembershipView>,
}

/// Attach statuses and pick the active membership.
#[must_use]
pub fn summarize_memberships(memberships: &[Membership], now: DateTime<Utc>) -> MembershipSummary {
    let mut history: Vec<MembershipView> = memberships
        .iter()
        .map(|m| {
            let period: MembershipPeriod = m.period();
            MembershipView {
                plan_id: m.plan_id.clone(),
                plan_name: m.plan_name.clone(),
                starts_at: m.starts_at,
                ends_at: m.ends_at,
                status: period.status_at(now),
                days_remaining: period.days_remaining(now),
            }
        })
        .collect();
    history.sort_by(|a, b| b.starts_at.cmp(&a.starts_at));

    let active = history
        .iter()
        .find(|m| m.status == MembershipStatus::Active)
        .cloned();

    MembershipSummary { active, history }
}

/// `GET /api/account/orders` - newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let mut orders = state
        .backend()
        .get_user_orders(&user.token, &user.id)
        .await?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(orders))
}

/// `GET /api/account/membership`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn membership(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<MembershipSummary>> {
    let memberships = state
        .backend()
        .get_memberships(&user.token, &user.id)
        .await?;
    Ok(Json(summarize_memberships(&memberships, Utc::now())))
}

/// `GET /api/account/bookings`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn bookings(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Booking>>> {
    Ok(Json(BookingService::new(state.backend()).list(&user).await?))
}

/// `POST /api/account/bookings`
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create_booking(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<BookingInput>,
) -> Result<(StatusCode, Json<Booking>)> {
    let booking = BookingService::new(state.backend())
        .create(&user, &input, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// `DELETE /api/account/bookings/{id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel_booking(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<BookingId>,
) -> Result<StatusCode> {
    BookingService::new(state.backend())
        .cancel(&user, &id, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
