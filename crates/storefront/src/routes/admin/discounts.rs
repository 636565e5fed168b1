//! Discount code management.
//!
//! Codes are checked against the same rules checkout applies, so a code that
//! saves here can actually be redeemed.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use ironhouse_core::DiscountId;
use ironhouse_core::discount::DiscountCode;
use rust_decimal::Decimal;
use tracing::instrument;

use crate::backend::{Discount, DiscountInput, DiscountType};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Normalize and check a discount before it is sent to the backend.
///
/// # Errors
///
/// Returns a message describing the first problem found.
pub fn validate_discount(mut input: DiscountInput) -> std::result::Result<DiscountInput, String> {
    input.code = DiscountCode::parse(&input.code)
        .map_err(|e| e.to_string())?
        .as_str()
        .to_string();

    if input.value <= Decimal::ZERO {
        return Err("value must be positive".to_string());
    }
    if input.discount_type == DiscountType::Percentage && input.value > Decimal::ONE_HUNDRED {
        return Err("percentage cannot exceed 100".to_string());
    }
    if input
        .min_order_amount
        .is_some_and(|m| m < Decimal::ZERO)
        || input
            .max_discount_amount
            .is_some_and(|m| m <= Decimal::ZERO)
    {
        return Err("order limits must be positive".to_string());
    }
    if let (Some(starts), Some(expires)) = (input.starts_at, input.expires_at)
        && expires <= starts
    {
        return Err("expiry must be after the start date".to_string());
    }
    if input.usage_limit == Some(0) {
        return Err("usage limit must be at least 1".to_string());
    }
    Ok(input)
}

/// `GET /api/admin/discounts`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<Discount>>> {
    Ok(Json(state.backend().get_discounts(&admin.token).await?))
}

/// `POST /api/admin/discounts`
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<DiscountInput>,
) -> Result<(StatusCode, Json<Discount>)> {
    let input = validate_discount(input).map_err(AppError::BadRequest)?;
    let discount = state
        .backend()
        .create_discount(&admin.token, &input)
        .await?;
    tracing::info!(code = %discount.code, "Discount created");
    Ok((StatusCode::CREATED, Json(discount)))
}

/// `PUT /api/admin/discounts/{id}`
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DiscountId>,
    Json(input): Json<DiscountInput>,
) -> Result<Json<Discount>> {
    let input = validate_discount(input).map_err(AppError::BadRequest)?;
    Ok(Json(
        state
            .backend()
            .update_discount(&admin.token, &id, &input)
            .await?,
    ))
}

/// `DELETE /api/admin/discounts/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DiscountId>,
) -> Result<StatusCode> {
    state.backend().delete_discount(&admin.token, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn input(kind: DiscountType, value: i64) -> DiscountInput {
        DiscountInput {
            code: " summer25 ".to_string(),
            discount_type: kind,
            value: Decimal::new(value, 0),
            min_order_amount: None,
            max_discount_amount: None,
            starts_at: None,
            expires_at: None,
            usage_limit: None,
            is_active: true,
        }
    }

    #[test]
    fn test_code_normalized() {
        let valid = validate_discount(input(DiscountType::Percentage, 25)).unwrap();
        assert_eq!(valid.code, "SUMMER25");
    }

    #[test]
    fn test_percentage_capped() {
        assert!(validate_discount(input(DiscountType::Percentage, 101)).is_err());
        assert!(validate_discount(input(DiscountType::Fixed, 500)).is_ok());
        assert!(validate_discount(input(DiscountType::Fixed, 0)).is_err());
    }

    #[test]
    fn test_dates_and_limits() {
        let now = Utc::now();
        let mut backwards = input(DiscountType::Fixed, 100);
        backwards.starts_at = Some(now);
        backwards.expires_at = Some(now - Duration::days(1));
        assert!(validate_discount(backwards).is_err());

        let mut zero_uses = input(DiscountType::Fixed, 100);
        zero_uses.usage_limit = Some(0);
        assert!(validate_discount(zero_uses).is_err());

        let mut bad_code = input(DiscountType::Fixed, 100);
        bad_code.code = "x".to_string();
        assert!(validate_discount(bad_code).is_err());
    }
}
