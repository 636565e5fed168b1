//! Checkout orchestration.
//!
//! # Product checkout
//!
//! 1. Re-validate every cart line against fresh stock.
//! 2. Price the cart, applying a discount code if given.
//! 3. Lock stock product by product. A failed lock releases every lock
//!    already taken, newest first.
//! 4. Create the payment order. If that fails, all locks are released.
//! 5. The caller stores the returned [`PendingCheckout`] in the session until
//!    the payment widget reports back through [`CheckoutService::confirm`] or
//!    is dismissed ([`CheckoutService::cancel`]).
//!
//! # Membership checkout
//!
//! Plans need no stock. A paid plan is subscribed with its period stacked on
//! any membership that is still running. The period is worked out before the
//! payment is verified. Once verified, the payment ID is kept on the pending
//! checkout so a failed subscription is retried without verifying again.

use chrono::{DateTime, Utc};
use ironhouse_core::cart::{Cart, CartError, CartLine, validate_quantity};
use ironhouse_core::discount::{DiscountCode, DiscountError, Totals};
use ironhouse_core::membership::{MembershipError, MembershipPeriod, renewal_start};
use ironhouse_core::{OrderId, PaymentOrderId, PlanId, Price, PriceError, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::backend::{
    AccessToken, BackendError, CreateOrderRequest, GymApiClient, Membership, OrderLineRequest,
    PaymentOrder, PaymentVerification, PlanOrderRequest, SubscribeRequest, VerifyPaymentRequest,
};
use crate::config::CheckoutConfig;
use crate::models::{CurrentUser, HeldLock, PendingCheckout, PendingPlanCheckout};

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("your cart is empty")]
    EmptyCart,

    #[error("only {available} of {name} left in stock")]
    OutOfStock {
        product_id: ProductId,
        name: String,
        available: u32,
    },

    #[error("{name} is no longer available")]
    Unavailable { product_id: ProductId, name: String },

    #[error("this plan is not available")]
    PlanUnavailable(PlanId),

    #[error("could not reserve stock for {name}")]
    LockFailed {
        product_id: ProductId,
        name: String,
        #[source]
        source: BackendError,
    },

    #[error("nothing to pay for")]
    NothingToCharge,

    #[error("no checkout in progress")]
    NoPendingCheckout,

    #[error("a paid membership is still being activated")]
    SubscriptionPending,

    #[error("payment order amount {actual} does not match checkout total {expected}")]
    AmountMismatch { expected: i64, actual: i64 },

    #[error("payment does not match the checkout in progress")]
    OrderMismatch,

    #[error("checkout expired, please try again")]
    CheckoutExpired,

    #[error("payment was not accepted: {0}")]
    PaymentRejected(String),

    #[error(transparent)]
    Discount(#[from] DiscountError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Price(#[from] PriceError),

    #[error(transparent)]
    Membership(#[from] MembershipError),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

impl CheckoutError {
    /// Whether the pending checkout is finished and should leave the session.
    #[must_use]
    pub const fn ends_checkout(&self) -> bool {
        matches!(self, Self::CheckoutExpired | Self::PaymentRejected(_))
    }
}

/// What the payment widget needs to open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentIntent {
    pub key_id: String,
    pub order_id: PaymentOrderId,
    /// Minor units.
    pub amount: i64,
    pub currency: String,
    pub totals: Totals,
    pub expires_at: DateTime<Utc>,
}

/// Callback data from the payment widget.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfirmation {
    pub order_id: PaymentOrderId,
    pub payment_id: String,
    pub signature: String,
}

/// A paid product order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmedOrder {
    pub order_id: Option<OrderId>,
    pub payment_id: String,
    pub totals: Totals,
}

/// Checkout orchestration over the backend's lock and payment endpoints.
pub struct CheckoutService<'a> {
    backend: &'a GymApiClient,
    config: &'a CheckoutConfig,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(backend: &'a GymApiClient, config: &'a CheckoutConfig) -> Self {
        Self { backend, config }
    }

    // =========================================================================
    // Pricing
    // =========================================================================

    /// Price a cart with an optional discount code.
    ///
    /// # Errors
    ///
    /// Returns `Discount` errors for unknown or inapplicable codes.
    #[instrument(skip(self, cart, token))]
    pub async fn quote(
        &self,
        cart: &Cart,
        code: Option<&DiscountCode>,
        token: Option<&AccessToken>,
        now: DateTime<Utc>,
    ) -> Result<Totals, CheckoutError> {
        let subtotal = cart.subtotal(self.config.currency)?;
        let rule = match code {
            Some(code) => {
                let discount = match self.backend.get_discount_by_code(token, code.as_str()).await {
                    Ok(discount) => discount,
                    Err(BackendError::NotFound(_)) => {
                        return Err(DiscountError::InvalidCode.into());
                    }
                    Err(e) => return Err(e.into()),
                };
                Some(discount.to_rule(self.config.currency)?)
            }
            None => None,
        };
        Ok(Totals::compute(subtotal, rule.as_ref(), now)?)
    }

    // =========================================================================
    // Product checkout
    // =========================================================================

    /// Lock stock and create a payment order for the member's cart.
    ///
    /// # Errors
    ///
    /// Returns a stock, discount or lock error. No locks are held when an
    /// error is returned.
    #[instrument(skip(self, user, code), fields(user_id = %user.id))]
    pub async fn start(
        &self,
        user: &CurrentUser,
        code: Option<&DiscountCode>,
        now: DateTime<Utc>,
    ) -> Result<(PendingCheckout, PaymentIntent), CheckoutError> {
        let cart = self
            .backend
            .get_cart(&user.token, &user.id)
            .await?
            .to_cart(self.config.currency);
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let cart = self.revalidate(&cart).await?;
        let totals = self.quote(&cart, code, Some(&user.token), now).await?;
        let amount = totals.total.to_minor_units()?;
        if amount <= 0 {
            return Err(CheckoutError::NothingToCharge);
        }

        let locks = self.acquire_locks(user, cart.lines()).await?;

        let request = CreateOrderRequest {
            user_id: &user.id,
            items: cart
                .lines()
                .iter()
                .map(|line| OrderLineRequest {
                    product_id: &line.product_id,
                    quantity: line.quantity,
                })
                .collect(),
            amount,
            currency: self.config.currency.code(),
            discount_code: totals.discount_code.as_ref().map(DiscountCode::as_str),
        };
        let order = match self.backend.create_order(&user.token, &request).await {
            Ok(order) => order,
            Err(e) => {
                tracing::warn!(error = %e, "Payment order creation failed, releasing stock locks");
                self.release_locks(user, &locks).await;
                return Err(e.into());
            }
        };
        if let Err(e) = ensure_amount(amount, &order) {
            self.release_locks(user, &locks).await;
            return Err(e);
        }

        let expires_at = now + lock_ttl(self.config);
        let intent = PaymentIntent {
            key_id: self.config.payment_key_id.clone(),
            order_id: order.order_id.clone(),
            amount,
            currency: self.config.currency.code().to_string(),
            totals: totals.clone(),
            expires_at,
        };
        let pending = PendingCheckout {
            payment_order_id: order.order_id,
            locks,
            totals,
            expires_at,
        };

        tracing::info!(
            order_id = %pending.payment_order_id,
            locks = pending.locks.len(),
            amount,
            "Checkout started"
        );
        Ok((pending, intent))
    }

    /// Verify a payment for a pending checkout.
    ///
    /// On success the member's cart is cleared. The caller must drop the
    /// pending checkout on success and whenever
    /// [`CheckoutError::ends_checkout`] is true.
    ///
    /// # Errors
    ///
    /// Returns `OrderMismatch`, `CheckoutExpired` or `PaymentRejected`.
    /// Expired and rejected checkouts have their locks released.
    #[instrument(skip(self, user, pending, payment), fields(user_id = %user.id, order_id = %pending.payment_order_id))]
    pub async fn confirm(
        &self,
        user: &CurrentUser,
        pending: &PendingCheckout,
        payment: &PaymentConfirmation,
        now: DateTime<Utc>,
    ) -> Result<ConfirmedOrder, CheckoutError> {
        if payment.order_id != pending.payment_order_id {
            return Err(CheckoutError::OrderMismatch);
        }
        if pending.is_expired(now) {
            self.release_locks(user, &pending.locks).await;
            return Err(CheckoutError::CheckoutExpired);
        }

        let verification = match self.verify(user, &pending.payment_order_id, payment).await {
            Ok(verification) => verification,
            Err(e) => {
                if e.ends_checkout() {
                    self.release_locks(user, &pending.locks).await;
                }
                return Err(e);
            }
        };

        if let Err(e) = self.backend.clear_cart(&user.token, &user.id).await {
            tracing::warn!(error = %e, "Payment verified but cart could not be cleared");
        }

        tracing::info!(payment_id = %payment.payment_id, "Checkout paid");
        Ok(ConfirmedOrder {
            order_id: verification.order_id,
            payment_id: payment.payment_id.clone(),
            totals: pending.totals.clone(),
        })
    }

    /// Release everything a pending checkout holds (payment widget dismissed).
    ///
    /// Returns the number of locks that could not be released.
    #[instrument(skip(self, user, pending), fields(user_id = %user.id, order_id = %pending.payment_order_id))]
    pub async fn cancel(&self, user: &CurrentUser, pending: &PendingCheckout) -> usize {
        let failures = self.release_locks(user, &pending.locks).await;
        tracing::info!(failures, "Checkout cancelled");
        failures
    }

    // =========================================================================
    // Membership checkout
    // =========================================================================

    /// Create a payment order for a membership plan.
    ///
    /// # Errors
    ///
    /// Returns `PlanUnavailable` for unknown or inactive plans.
    #[instrument(skip(self, user), fields(user_id = %user.id, plan_id = %plan_id))]
    pub async fn start_plan(
        &self,
        user: &CurrentUser,
        plan_id: &PlanId,
        now: DateTime<Utc>,
    ) -> Result<(PendingPlanCheckout, PaymentIntent), CheckoutError> {
        let plan = match self.backend.get_plan(plan_id).await {
            Ok(plan) if plan.is_active => plan,
            Ok(_) | Err(BackendError::NotFound(_)) => {
                return Err(CheckoutError::PlanUnavailable(plan_id.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        // Reject broken plans before taking money for them.
        MembershipPeriod::starting(now, plan.duration_days)?;

        let price = Price::new(plan.price, self.config.currency).round_to_cents();
        let amount = price.to_minor_units()?;
        if amount <= 0 {
            return Err(CheckoutError::NothingToCharge);
        }

        let order = self
            .backend
            .create_plan_order(
                &user.token,
                &PlanOrderRequest {
                    user_id: &user.id,
                    plan_id,
                    amount,
                    currency: self.config.currency.code(),
                },
            )
            .await?;
        ensure_amount(amount, &order)?;

        let expires_at = now + lock_ttl(self.config);
        let intent = PaymentIntent {
            key_id: self.config.payment_key_id.clone(),
            order_id: order.order_id.clone(),
            amount,
            currency: self.config.currency.code().to_string(),
            totals: Totals::compute(price, None, now)?,
            expires_at,
        };
        let pending = PendingPlanCheckout {
            payment_order_id: order.order_id,
            plan_id: plan_id.clone(),
            amount: price,
            expires_at,
            paid_payment_id: None,
        };
        Ok((pending, intent))
    }

    /// Verify a plan payment and subscribe.
    ///
    /// The membership period is computed before verification, so a backend
    /// outage there never follows a successful charge. After verification
    /// `pending.paid_payment_id` is set and the caller must keep `pending` in
    /// the session until the subscription succeeds.
    ///
    /// # Errors
    ///
    /// Returns `OrderMismatch`, `CheckoutExpired` or `PaymentRejected`, or a
    /// backend error from loading the plan or subscribing.
    #[instrument(skip(self, user, pending, payment), fields(user_id = %user.id, plan_id = %pending.plan_id))]
    pub async fn confirm_plan(
        &self,
        user: &CurrentUser,
        pending: &mut PendingPlanCheckout,
        payment: &PaymentConfirmation,
        now: DateTime<Utc>,
    ) -> Result<Membership, CheckoutError> {
        if payment.order_id != pending.payment_order_id {
            return Err(CheckoutError::OrderMismatch);
        }
        if !pending.is_paid() && pending.is_expired(now) {
            return Err(CheckoutError::CheckoutExpired);
        }

        let period = self.plan_period(user, &pending.plan_id, now).await?;

        let payment_id = if let Some(paid) = pending.paid_payment_id.clone() {
            tracing::info!(payment_id = %paid, "Payment already verified, retrying subscription");
            paid
        } else {
            self.verify(user, &pending.payment_order_id, payment).await?;
            pending.paid_payment_id = Some(payment.payment_id.clone());
            payment.payment_id.clone()
        };

        let membership = match self
            .backend
            .subscribe(
                &user.token,
                &SubscribeRequest {
                    user_id: &user.id,
                    plan_id: &pending.plan_id,
                    payment_id: &payment_id,
                    starts_at: period.starts_at,
                    ends_at: period.ends_at,
                },
            )
            .await
        {
            Ok(membership) => membership,
            Err(e) => {
                tracing::error!(
                    payment_id = %payment_id,
                    error = %e,
                    "Payment verified but subscription failed"
                );
                return Err(e.into());
            }
        };

        tracing::info!(
            starts_at = %period.starts_at,
            ends_at = %period.ends_at,
            "Membership purchased"
        );
        Ok(membership)
    }

    /// The period a new membership on `plan_id` would cover.
    async fn plan_period(
        &self,
        user: &CurrentUser,
        plan_id: &PlanId,
        now: DateTime<Utc>,
    ) -> Result<MembershipPeriod, CheckoutError> {
        let plan = match self.backend.get_plan(plan_id).await {
            Ok(plan) => plan,
            Err(BackendError::NotFound(_)) => {
                return Err(CheckoutError::PlanUnavailable(plan_id.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        let existing: Vec<MembershipPeriod> = self
            .backend
            .get_memberships(&user.token, &user.id)
            .await?
            .iter()
            .map(Membership::period)
            .collect();
        let starts_at = renewal_start(&existing, now);
        Ok(MembershipPeriod::starting(starts_at, plan.duration_days)?)
    }

    // =========================================================================
    // Locks
    // =========================================================================

    /// Release locks newest first. Failures are logged and counted.
    pub async fn release_locks(&self, user: &CurrentUser, locks: &[HeldLock]) -> usize {
        let mut failures = 0;
        for lock in locks.iter().rev() {
            if let Err(e) = self
                .backend
                .release_lock(&user.token, &user.id, &lock.product_id, lock.quantity)
                .await
            {
                failures += 1;
                tracing::error!(
                    product_id = %lock.product_id,
                    quantity = lock.quantity,
                    error = %e,
                    "Failed to release stock lock"
                );
            }
        }
        failures
    }

    async fn acquire_locks(
        &self,
        user: &CurrentUser,
        lines: &[CartLine],
    ) -> Result<Vec<HeldLock>, CheckoutError> {
        let mut held = Vec::with_capacity(lines.len());
        for line in lines {
            match self
                .backend
                .lock_stock(&user.token, &user.id, &line.product_id, line.quantity)
                .await
            {
                Ok(lock) => held.push(HeldLock {
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                    lock_id: lock.lock_id,
                }),
                Err(e) => {
                    tracing::warn!(
                        product_id = %line.product_id,
                        held = held.len(),
                        error = %e,
                        "Stock lock failed, rolling back"
                    );
                    self.release_locks(user, &held).await;
                    return Err(CheckoutError::LockFailed {
                        product_id: line.product_id.clone(),
                        name: line.name.clone(),
                        source: e,
                    });
                }
            }
        }
        Ok(held)
    }

    /// Rebuild the cart from fresh product data, rejecting lines that can no
    /// longer be bought.
    async fn revalidate(&self, cart: &Cart) -> Result<Cart, CheckoutError> {
        let mut lines = Vec::with_capacity(cart.lines().len());
        for line in cart.lines() {
            let product = match self.backend.get_product_fresh(&line.product_id).await {
                Ok(product) => product,
                Err(BackendError::NotFound(_)) => {
                    return Err(CheckoutError::Unavailable {
                        product_id: line.product_id.clone(),
                        name: line.name.clone(),
                    });
                }
                Err(e) => return Err(e.into()),
            };
            if !product.is_active {
                return Err(CheckoutError::Unavailable {
                    product_id: product.id,
                    name: product.name,
                });
            }
            if product.stock < line.quantity {
                return Err(CheckoutError::OutOfStock {
                    product_id: product.id,
                    name: product.name,
                    available: product.stock,
                });
            }
            validate_quantity(line.quantity, Some(product.stock))?;
            lines.push(product.cart_line(line.quantity, self.config.currency));
        }
        Ok(lines.into_iter().collect())
    }

    async fn verify(
        &self,
        user: &CurrentUser,
        order_id: &PaymentOrderId,
        payment: &PaymentConfirmation,
    ) -> Result<PaymentVerification, CheckoutError> {
        let request = VerifyPaymentRequest {
            user_id: &user.id,
            order_id,
            payment_id: &payment.payment_id,
            signature: &payment.signature,
        };
        match self.backend.verify_payment(&user.token, &request).await {
            Ok(verification) if verification.verified => Ok(verification),
            Ok(verification) => Err(CheckoutError::PaymentRejected(
                verification
                    .message
                    .unwrap_or_else(|| "payment could not be verified".to_string()),
            )),
            Err(BackendError::Rejected(message)) => Err(CheckoutError::PaymentRejected(message)),
            Err(e) => Err(e.into()),
        }
    }
}

/// The payment widget must charge exactly what the member was quoted.
fn ensure_amount(expected: i64, order: &PaymentOrder) -> Result<(), CheckoutError> {
    if order.amount == expected {
        Ok(())
    } else {
        tracing::error!(
            order_id = %order.order_id,
            expected,
            actual = order.amount,
            "Payment order amount differs from checkout total"
        );
        Err(CheckoutError::AmountMismatch {
            expected,
            actual: order.amount,
        })
    }
}

fn lock_ttl(config: &CheckoutConfig) -> chrono::Duration {
    chrono::Duration::from_std(config.lock_ttl).unwrap_or_else(|_| chrono::Duration::minutes(10))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_terminal_errors_end_checkout() {
        assert!(CheckoutError::CheckoutExpired.ends_checkout());
        assert!(CheckoutError::PaymentRejected("bad signature".into()).ends_checkout());
        assert!(!CheckoutError::OrderMismatch.ends_checkout());
        assert!(!CheckoutError::Backend(BackendError::RateLimited(5)).ends_checkout());
    }

    #[test]
    fn test_order_amount_must_match_total() {
        let order = PaymentOrder {
            order_id: PaymentOrderId::new("order_1"),
            amount: 449_820,
            currency: "INR".to_string(),
        };
        assert!(ensure_amount(449_820, &order).is_ok());
        assert!(matches!(
            ensure_amount(449_800, &order),
            Err(CheckoutError::AmountMismatch {
                expected: 449_800,
                actual: 449_820
            })
        ));
    }

    #[test]
    fn test_lock_ttl_conversion() {
        let config = CheckoutConfig {
            payment_key_id: "rzp_test_key".to_string(),
            currency: ironhouse_core::CurrencyCode::INR,
            lock_ttl: std::time::Duration::from_secs(90),
        };
        assert_eq!(lock_ttl(&config), chrono::Duration::seconds(90));
    }
}
