//! Product and membership plan management.
//!
//! Every write goes through [`GymApiClient`](crate::backend::GymApiClient),
//! which drops the affected catalog cache entries.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use ironhouse_core::{PlanId, ProductId};
use rust_decimal::Decimal;
use tracing::instrument;

use crate::backend::{MembershipPlan, PlanInput, Product, ProductInput};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

const MAX_NAME_LENGTH: usize = 200;

fn validate_name(name: &str) -> std::result::Result<String, String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err("name must be 1-200 characters".to_string());
    }
    Ok(name.to_string())
}

/// # Errors
///
/// Returns a message describing the first problem found.
pub fn validate_product(mut input: ProductInput) -> std::result::Result<ProductInput, String> {
    input.name = validate_name(&input.name)?;
    if input.price < Decimal::ZERO {
        return Err("price cannot be negative".to_string());
    }
    input.category = input
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    Ok(input)
}

/// # Errors
///
/// Returns a message describing the first problem found.
pub fn validate_plan(mut input: PlanInput) -> std::result::Result<PlanInput, String> {
    input.name = validate_name(&input.name)?;
    if input.price <= Decimal::ZERO {
        return Err("price must be positive".to_string());
    }
    if input.duration_days == 0 {
        return Err("duration must be at least one day".to_string());
    }
    input.features.retain(|f| !f.trim().is_empty());
    Ok(input)
}

// =============================================================================
// Products
// =============================================================================

/// `POST /api/admin/products`
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let input = validate_product(input).map_err(AppError::BadRequest)?;
    let product = state.backend().create_product(&admin.token, &input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/admin/products/{id}`
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>> {
    let input = validate_product(input).map_err(AppError::BadRequest)?;
    Ok(Json(
        state
            .backend()
            .update_product(&admin.token, &id, &input)
            .await?,
    ))
}

/// `DELETE /api/admin/products/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    state.backend().delete_product(&admin.token, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Plans
// =============================================================================

/// `POST /api/admin/plans`
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn create_plan(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<PlanInput>,
) -> Result<(StatusCode, Json<MembershipPlan>)> {
    let input = validate_plan(input).map_err(AppError::BadRequest)?;
    let plan = state.backend().create_plan(&admin.token, &input).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// `PUT /api/admin/plans/{id}`
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update_plan(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<PlanId>,
    Json(input): Json<PlanInput>,
) -> Result<Json<MembershipPlan>> {
    let input = validate_plan(input).map_err(AppError::BadRequest)?;
    Ok(Json(
        state.backend().update_plan(&admin.token, &id, &input).await?,
    ))
}

/// `DELETE /api/admin/plans/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_plan(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<PlanId>,
) -> Result<StatusCode> {
    state.backend().delete_plan(&admin.token, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_validation() {
        let input = ProductInput {
            name: "  Resistance Bands ".to_string(),
            description: String::new(),
            price: Decimal::new(799, 0),
            category: Some("   ".to_string()),
            stock: 40,
            image_url: None,
            is_active: true,
        };
        let valid = validate_product(input.clone()).unwrap();
        assert_eq!(valid.name, "Resistance Bands");
        assert_eq!(valid.category, None);

        let negative = ProductInput {
            price: Decimal::new(-1, 0),
            ..input.clone()
        };
        assert!(validate_product(negative).is_err());

        let unnamed = ProductInput {
            name: " ".to_string(),
            ..input
        };
        assert!(validate_product(unnamed).is_err());
    }

    #[test]
    fn test_plan_validation() {
        let input = PlanInput {
            name: "Quarterly".to_string(),
            description: String::new(),
            price: Decimal::new(4500, 0),
            duration_days: 90,
            features: vec!["Locker".to_string(), " ".to_string()],
            is_active: true,
        };
        assert_eq!(validate_plan(input.clone()).unwrap().features, vec!["Locker"]);

        let zero_days = PlanInput {
            duration_days: 0,
            ..input.clone()
        };
        assert!(validate_plan(zero_days).is_err());

        let free = PlanInput {
            price: Decimal::ZERO,
            ..input
        };
        assert!(validate_plan(free).is_err());
    }
}
