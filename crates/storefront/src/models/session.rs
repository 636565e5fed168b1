//! Session-related types.
//!
//! Everything the storefront remembers between requests lives in the
//! session: who is logged in, the guest cart, and checkouts waiting on the
//! payment widget.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ironhouse_core::discount::Totals;
use ironhouse_core::{Email, EmailError, LockId, PaymentOrderId, PlanId, Price, ProductId, UserId, UserRole};

use crate::backend::{AccessToken, AuthResponse};

/// Session-stored user identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Backend user ID.
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: UserRole,
    /// Bearer token for calls made on the user's behalf.
    pub token: AccessToken,
}

impl CurrentUser {
    /// Build from a successful login or OTP verification.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the backend sent an unusable email.
    pub fn from_auth(auth: AuthResponse) -> Result<Self, EmailError> {
        Ok(Self {
            id: auth.user.id,
            email: Email::parse(&auth.user.email)?,
            name: auth.user.name,
            role: auth.user.role,
            token: auth.token,
        })
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// A stock reservation held for a pending checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldLock {
    pub product_id: ProductId,
    pub quantity: u32,
    pub lock_id: Option<LockId>,
}

/// A product checkout waiting for the payment widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCheckout {
    pub payment_order_id: PaymentOrderId,
    pub locks: Vec<HeldLock>,
    pub totals: Totals,
    pub expires_at: DateTime<Utc>,
}

impl PendingCheckout {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A membership purchase waiting for the payment widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPlanCheckout {
    pub payment_order_id: PaymentOrderId,
    pub plan_id: PlanId,
    pub amount: Price,
    pub expires_at: DateTime<Utc>,
    /// Set once the payment is verified and only the subscription is left.
    #[serde(default)]
    pub paid_payment_id: Option<String>,
}

impl PendingPlanCheckout {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    #[must_use]
    pub const fn is_paid(&self) -> bool {
        self.paid_payment_id.is_some()
    }
}

/// Session keys.
pub mod keys {
    /// The logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Cart of a visitor who has not logged in.
    pub const GUEST_CART: &str = "guest_cart";

    /// Product checkout holding stock locks.
    pub const PENDING_CHECKOUT: &str = "pending_checkout";

    /// Membership checkout.
    pub const PENDING_PLAN_CHECKOUT: &str = "pending_plan_checkout";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_current_user_from_auth_normalizes_email() {
        let auth: AuthResponse = serde_json::from_value(json!({
            "token": "jwt.token.sig",
            "user": { "_id": "u42", "name": "Asha", "email": " Asha@Example.in ", "role": "admin" }
        }))
        .unwrap();

        let user = CurrentUser::from_auth(auth).unwrap();
        assert_eq!(user.id.as_str(), "u42");
        assert_eq!(user.email.as_str(), "asha@example.in");
        assert!(user.is_admin());
        assert_eq!(user.token.expose(), "jwt.token.sig");
    }

    #[test]
    fn test_pending_checkout_expiry() {
        let now = Utc::now();
        let pending = PendingPlanCheckout {
            payment_order_id: PaymentOrderId::new("order_1"),
            plan_id: PlanId::new("gold"),
            amount: Price::zero(ironhouse_core::CurrencyCode::INR),
            expires_at: now,
            paid_payment_id: None,
        };
        assert!(pending.is_expired(now));
        assert!(!pending.is_expired(now - chrono::Duration::seconds(1)));
    }
}
