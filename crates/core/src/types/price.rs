//! Type-safe price representation using decimal arithmetic.
//!
//! Prices come from the backend as decimal numbers in the major unit
//! (rupees, dollars). The payment gateway wants integer minor units
//! (paise, cents), so conversion lives here next to the arithmetic.

use core::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from price arithmetic and conversion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("cannot combine {left:?} with {right:?}")]
    CurrencyMismatch {
        left: CurrencyCode,
        right: CurrencyCode,
    },
    #[error("amount {0} cannot be charged")]
    NotChargeable(Decimal),
    #[error("arithmetic overflow")]
    Overflow,
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., rupees, not paise).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Build a price from integer minor units (paise, cents).
    #[must_use]
    pub fn from_minor_units(minor: i64, currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::new(minor, 2), currency_code)
    }

    /// Add two prices of the same currency.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::CurrencyMismatch` for different currencies and
    /// `PriceError::Overflow` if the sum does not fit.
    pub fn checked_add(self, other: Self) -> Result<Self, PriceError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(PriceError::Overflow)?;
        Ok(Self::new(amount, self.currency_code))
    }

    /// Subtract a price of the same currency, flooring at zero.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::CurrencyMismatch` for different currencies.
    pub fn saturating_sub(self, other: Self) -> Result<Self, PriceError> {
        self.ensure_same_currency(other)?;
        let amount = (self.amount - other.amount).max(Decimal::ZERO);
        Ok(Self::new(amount, self.currency_code))
    }

    /// Multiply by a quantity.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the product does not fit.
    pub fn times(self, quantity: u32) -> Result<Self, PriceError> {
        let amount = self
            .amount
            .checked_mul(Decimal::from(quantity))
            .ok_or(PriceError::Overflow)?;
        Ok(Self::new(amount, self.currency_code))
    }

    /// Round to two decimal places, midpoint away from zero.
    #[must_use]
    pub fn round_to_cents(self) -> Self {
        Self::new(
            self.amount
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            self.currency_code,
        )
    }

    /// Convert to integer minor units for the payment gateway.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::NotChargeable` for negative amounts and
    /// `PriceError::Overflow` if the value does not fit in an `i64`.
    pub fn to_minor_units(self) -> Result<i64, PriceError> {
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(PriceError::NotChargeable(self.amount));
        }
        self.round_to_cents()
            .amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|minor| minor.to_i64())
            .ok_or(PriceError::Overflow)
    }

    /// Whether the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Format for display (e.g., "₹1499.00").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount)
    }

    /// # Errors
    ///
    /// Returns `PriceError::CurrencyMismatch` for different currencies.
    pub fn ensure_same_currency(self, other: Self) -> Result<(), PriceError> {
        if self.currency_code == other.currency_code {
            Ok(())
        } else {
            Err(PriceError::CurrencyMismatch {
                left: self.currency_code,
                right: other.currency_code,
            })
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes accepted by the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// ISO code string.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INR" => Ok(Self::INR),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn inr(s: &str) -> Price {
        Price::new(s.parse().unwrap(), CurrencyCode::INR)
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(inr("1499").to_minor_units().unwrap(), 149_900);
        assert_eq!(inr("0.105").to_minor_units().unwrap(), 11);
        assert_eq!(inr("0").to_minor_units().unwrap(), 0);
        assert!(matches!(
            inr("-1").to_minor_units(),
            Err(PriceError::NotChargeable(_))
        ));
        assert_eq!(
            Price::from_minor_units(149_950, CurrencyCode::INR),
            inr("1499.50")
        );
    }

    #[test]
    fn test_round_midpoint_away_from_zero() {
        assert_eq!(inr("2.345").round_to_cents(), inr("2.35"));
        assert_eq!(inr("2.344").round_to_cents(), inr("2.34"));
    }

    #[test]
    fn test_add_rejects_mixed_currency() {
        let usd = Price::new(Decimal::ONE, CurrencyCode::USD);
        assert!(matches!(
            inr("1").checked_add(usd),
            Err(PriceError::CurrencyMismatch { .. })
        ));
        assert_eq!(inr("1.50").checked_add(inr("2.25")).unwrap(), inr("3.75"));
    }

    #[test]
    fn test_saturating_sub_floors_at_zero() {
        assert_eq!(inr("10").saturating_sub(inr("25")).unwrap(), inr("0"));
        assert_eq!(inr("10").saturating_sub(inr("2.5")).unwrap(), inr("7.5"));
    }

    #[test]
    fn test_times_and_display() {
        assert_eq!(inr("499.5").times(3).unwrap().display(), "₹1498.50");
        assert_eq!(Price::zero(CurrencyCode::USD).display(), "$0.00");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("inr".parse::<CurrencyCode>().unwrap(), CurrencyCode::INR);
        assert!("JPY".parse::<CurrencyCode>().is_err());
    }
}
