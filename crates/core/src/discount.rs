//! Discount codes and order totals.
//!
//! Codes are created by admins in the backend. The storefront validates them
//! against the current cart before a payment order is created, so the amount
//! charged always matches the totals the member was shown.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Price, PriceError};

const MIN_CODE_LENGTH: usize = 3;
const MAX_CODE_LENGTH: usize = 32;

/// Reasons a discount cannot be applied.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiscountError {
    #[error("discount code must be 3-32 letters, digits, '-' or '_'")]
    InvalidCode,
    #[error("discount code is not active")]
    Inactive,
    #[error("discount code is not valid yet")]
    NotStarted,
    #[error("discount code has expired")]
    Expired,
    #[error("discount code has reached its usage limit")]
    UsageLimitReached,
    #[error("order must be at least {minimum} to use this code")]
    BelowMinimum { minimum: Price },
    #[error("percentage must be between 0 and 100")]
    InvalidPercentage,
    #[error(transparent)]
    Price(#[from] PriceError),
}

/// A normalized discount code (uppercase).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiscountCode(String);

impl DiscountCode {
    /// Parse a code as typed by a member.
    ///
    /// # Errors
    ///
    /// Returns `DiscountError::InvalidCode` for empty, oversized or
    /// malformed input.
    pub fn parse(s: &str) -> Result<Self, DiscountError> {
        let code = s.trim().to_ascii_uppercase();
        let valid_len = (MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&code.len());
        let valid_chars = code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid_len || !valid_chars {
            return Err(DiscountError::InvalidCode);
        }
        Ok(Self(code))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DiscountCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DiscountCode {
    type Error = DiscountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DiscountCode> for String {
    fn from(code: DiscountCode) -> Self {
        code.0
    }
}

/// How much a code takes off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountKind {
    /// Percentage of the subtotal, 0-100.
    Percentage { percent: Decimal },
    /// Flat amount off.
    Fixed { amount: Price },
}

/// A discount code with its constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRule {
    pub code: DiscountCode,
    pub kind: DiscountKind,
    pub min_order: Option<Price>,
    pub max_discount: Option<Price>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub usage_limit: Option<u32>,
    pub usage_count: u32,
    pub active: bool,
}

impl DiscountRule {
    /// Check whether the code can be applied to `subtotal` at `now`.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`DiscountError`].
    pub fn validate(&self, subtotal: Price, now: DateTime<Utc>) -> Result<(), DiscountError> {
        if !self.active {
            return Err(DiscountError::Inactive);
        }
        if self.starts_at.is_some_and(|start| now < start) {
            return Err(DiscountError::NotStarted);
        }
        if self.ends_at.is_some_and(|end| now >= end) {
            return Err(DiscountError::Expired);
        }
        if self
            .usage_limit
            .is_some_and(|limit| self.usage_count >= limit)
        {
            return Err(DiscountError::UsageLimitReached);
        }
        if let DiscountKind::Percentage { percent } = self.kind
            && (percent.is_sign_negative() || percent > Decimal::ONE_HUNDRED)
        {
            return Err(DiscountError::InvalidPercentage);
        }
        if let Some(minimum) = self.min_order {
            // Currency mismatch surfaces here rather than silently passing.
            let shortfall = minimum.saturating_sub(subtotal)?;
            if !shortfall.is_zero() {
                return Err(DiscountError::BelowMinimum { minimum });
            }
        }
        Ok(())
    }

    /// Amount taken off `subtotal`. Never negative, never more than `subtotal`.
    ///
    /// # Errors
    ///
    /// Returns `DiscountError::Price` if currencies differ.
    pub fn discount_for(&self, subtotal: Price) -> Result<Price, DiscountError> {
        let raw = match self.kind {
            DiscountKind::Percentage { percent } => {
                let percent = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
                Price::new(
                    subtotal.amount * percent / Decimal::ONE_HUNDRED,
                    subtotal.currency_code,
                )
                .round_to_cents()
            }
            DiscountKind::Fixed { amount } => {
                subtotal.ensure_same_currency(amount)?;
                Price::new(amount.amount.max(Decimal::ZERO), amount.currency_code)
            }
        };

        let capped = match self.max_discount {
            Some(cap) => {
                subtotal.ensure_same_currency(cap)?;
                Price::new(raw.amount.min(cap.amount), raw.currency_code)
            }
            None => raw,
        };

        Ok(Price::new(
            capped.amount.min(subtotal.amount).max(Decimal::ZERO),
            subtotal.currency_code,
        ))
    }
}

/// Subtotal, discount and amount to charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Price,
    pub discount: Price,
    pub total: Price,
    pub discount_code: Option<DiscountCode>,
}

impl Totals {
    /// Compute totals, applying `rule` if given.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if the rule does not apply.
    pub fn compute(
        subtotal: Price,
        rule: Option<&DiscountRule>,
        now: DateTime<Utc>,
    ) -> Result<Self, DiscountError> {
        let Some(rule) = rule else {
            return Ok(Self {
                subtotal,
                discount: Price::zero(subtotal.currency_code),
                total: subtotal,
                discount_code: None,
            });
        };

        rule.validate(subtotal, now)?;
        let discount = rule.discount_for(subtotal)?;
        let total = subtotal.saturating_sub(discount)?;

        Ok(Self {
            subtotal,
            discount,
            total,
            discount_code: Some(rule.code.clone()),
        })
    }
}
