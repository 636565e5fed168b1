//! Membership plans, trainers and homepage content.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use ironhouse_core::{PlanId, TrainerId};
use tracing::instrument;

use crate::backend::{BackendError, MembershipPlan, Resource, Trainer};
use crate::error::{AppError, Result};
use crate::services::{BookingService, ContentService, HomepageContent};
use crate::state::AppState;

// =============================================================================
// Plans
// =============================================================================

/// `GET /api/plans` - active plans, cheapest first.
#[instrument(skip(state))]
pub async fn plans(State(state): State<AppState>) -> Result<Json<Vec<MembershipPlan>>> {
    let mut plans: Vec<MembershipPlan> = state
        .backend()
        .get_plans()
        .await?
        .iter()
        .filter(|p| p.is_active)
        .cloned()
        .collect();
    plans.sort_by(|a, b| a.price.cmp(&b.price));
    Ok(Json(plans))
}

/// `GET /api/plans/{id}`
#[instrument(skip(state))]
pub async fn plan(
    State(state): State<AppState>,
    Path(id): Path<PlanId>,
) -> Result<Json<MembershipPlan>> {
    match state.backend().get_plan(&id).await {
        Ok(plan) if plan.is_active => Ok(Json(plan)),
        Ok(_) | Err(BackendError::NotFound(_)) => Err(AppError::NotFound(format!("plan {id}"))),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Trainers
// =============================================================================

/// `GET /api/trainers`
#[instrument(skip(state))]
pub async fn trainers(State(state): State<AppState>) -> Result<Json<Vec<Trainer>>> {
    Ok(Json(BookingService::new(state.backend()).trainers().await?))
}

/// `GET /api/trainers/{id}`
#[instrument(skip(state))]
pub async fn trainer(
    State(state): State<AppState>,
    Path(id): Path<TrainerId>,
) -> Result<Json<Trainer>> {
    Ok(Json(BookingService::new(state.backend()).trainer(&id).await?))
}

// =============================================================================
// Content
// =============================================================================

/// `GET /api/content/home`
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<Json<HomepageContent>> {
    let content = ContentService::new(state.backend())
        .homepage(Utc::now())
        .await?;
    Ok(Json(content))
}

/// `GET /api/content/resources/{title}`
#[instrument(skip(state))]
pub async fn resource(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<Json<Resource>> {
    match ContentService::new(state.backend()).by_title(&title).await {
        Ok(resource) => Ok(Json(resource)),
        Err(BackendError::NotFound(_)) => Err(AppError::NotFound(format!("resource {title}"))),
        Err(e) => Err(e.into()),
    }
}
