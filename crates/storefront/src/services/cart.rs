//! Cart service.
//!
//! Visitors who are not logged in keep a guest cart in their session. Logged
//! in members use the backend cart. Both go through the same quantity rules
//! from `ironhouse_core::cart`, and the guest cart is folded into the
//! member's cart when they log in.

use ironhouse_core::cart::{Cart, CartError, validate_quantity};
use ironhouse_core::{CurrencyCode, ProductId};
use thiserror::Error;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{BackendError, GymApiClient, Product};
use crate::models::{CurrentUser, session_keys};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartServiceError {
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Product is inactive or gone.
    #[error("product {0} is no longer available")]
    Unavailable(ProductId),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Result of folding a guest cart into a member's cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub merged: usize,
    pub skipped: usize,
}

/// Cart operations for guests and members.
pub struct CartService<'a> {
    backend: &'a GymApiClient,
    session: &'a Session,
    currency: CurrencyCode,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(backend: &'a GymApiClient, session: &'a Session, currency: CurrencyCode) -> Self {
        Self {
            backend,
            session,
            currency,
        }
    }

    /// The current cart: the backend cart for members, the session cart for guests.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be loaded.
    pub async fn view(&self, user: Option<&CurrentUser>) -> Result<Cart, CartServiceError> {
        match user {
            Some(user) => Ok(self
                .backend
                .get_cart(&user.token, &user.id)
                .await?
                .to_cart(self.currency)),
            None => self.guest_cart().await,
        }
    }

    /// Add units of a product.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` for inactive products, or a quantity error when
    /// the combined quantity breaks stock or the per-line limit.
    #[instrument(skip(self, user), fields(product_id = %product_id))]
    pub async fn add(
        &self,
        user: Option<&CurrentUser>,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, CartServiceError> {
        let product = self.available_product(product_id).await?;
        let mut cart = self.view(user).await?;
        cart.add(product.cart_line(quantity, self.currency))?;

        match user {
            Some(user) => {
                self.backend
                    .add_to_cart(&user.token, &user.id, product_id, quantity)
                    .await?;
                self.view(Some(user)).await
            }
            None => {
                self.save_guest_cart(&cart).await?;
                Ok(cart)
            }
        }
    }

    /// Set the quantity of a line. Zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` for products not in the cart, or a quantity error.
    #[instrument(skip(self, user), fields(product_id = %product_id))]
    pub async fn set_quantity(
        &self,
        user: Option<&CurrentUser>,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, CartServiceError> {
        if quantity == 0 {
            return self.remove(user, product_id).await;
        }

        let mut cart = self.view(user).await?;
        if cart.get(product_id).is_none() {
            return Err(CartError::LineNotFound(product_id.clone()).into());
        }
        let product = self.available_product(product_id).await?;
        validate_quantity(quantity, Some(product.stock))?;

        match user {
            Some(user) => {
                self.backend
                    .update_cart_quantity(&user.token, &user.id, product_id, quantity)
                    .await?;
                self.view(Some(user)).await
            }
            None => {
                cart.set_stock(product_id, product.stock);
                cart.set_quantity(product_id, quantity)?;
                self.save_guest_cart(&cart).await?;
                Ok(cart)
            }
        }
    }

    /// # Errors
    ///
    /// Returns `LineNotFound` for products not in the cart.
    #[instrument(skip(self, user), fields(product_id = %product_id))]
    pub async fn remove(
        &self,
        user: Option<&CurrentUser>,
        product_id: &ProductId,
    ) -> Result<Cart, CartServiceError> {
        let mut cart = self.view(user).await?;
        if !cart.remove(product_id) {
            return Err(CartError::LineNotFound(product_id.clone()).into());
        }

        match user {
            Some(user) => {
                self.backend
                    .remove_from_cart(&user.token, &user.id, product_id)
                    .await?;
                self.view(Some(user)).await
            }
            None => {
                self.save_guest_cart(&cart).await?;
                Ok(cart)
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if the cart cannot be cleared.
    pub async fn clear(&self, user: Option<&CurrentUser>) -> Result<(), CartServiceError> {
        match user {
            Some(user) => self.backend.clear_cart(&user.token, &user.id).await?,
            None => {
                self.session
                    .remove::<Cart>(session_keys::GUEST_CART)
                    .await?;
            }
        }
        Ok(())
    }

    /// Number of units in the cart, for the header badge.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be loaded.
    pub async fn count(&self, user: Option<&CurrentUser>) -> Result<u32, CartServiceError> {
        Ok(self.view(user).await?.item_count())
    }

    /// Fold the guest cart into the member's backend cart.
    ///
    /// Quantities are clamped to current stock and the per-line limit
    /// instead of failing. Lines that cannot be added are logged and skipped.
    /// The guest cart is removed afterwards either way.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session or the member's cart cannot be read.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn merge_guest_into_user(
        &self,
        user: &CurrentUser,
    ) -> Result<MergeOutcome, CartServiceError> {
        let guest = self.guest_cart().await?;
        if guest.is_empty() {
            return Ok(MergeOutcome::default());
        }

        let current = self.view(Some(user)).await?;
        let mut outcome = MergeOutcome::default();

        let mut fresh_lines = Vec::with_capacity(guest.lines().len());
        for line in guest.lines() {
            match self.available_product(&line.product_id).await {
                Ok(product) => fresh_lines.push(product.cart_line(line.quantity, self.currency)),
                Err(e) => {
                    tracing::warn!(product_id = %line.product_id, error = %e, "Skipping guest cart line");
                    outcome.skipped += 1;
                }
            }
        }

        let refreshed: Cart = fresh_lines.into_iter().collect();
        let mut target = current.clone();
        target.merge(refreshed.clone());

        for line in refreshed.lines() {
            let before = current.get(&line.product_id).map_or(0, |l| l.quantity);
            let after = target.get(&line.product_id).map_or(0, |l| l.quantity);
            let delta = after.saturating_sub(before);
            if delta == 0 {
                outcome.skipped += 1;
                continue;
            }

            match self
                .backend
                .add_to_cart(&user.token, &user.id, &line.product_id, delta)
                .await
            {
                Ok(()) => outcome.merged += 1,
                Err(e) => {
                    tracing::warn!(product_id = %line.product_id, error = %e, "Failed to merge guest cart line");
                    outcome.skipped += 1;
                }
            }
        }

        self.session
            .remove::<Cart>(session_keys::GUEST_CART)
            .await?;
        tracing::info!(merged = outcome.merged, skipped = outcome.skipped, "Merged guest cart");
        Ok(outcome)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn available_product(&self, product_id: &ProductId) -> Result<Product, CartServiceError> {
        let product = match self.backend.get_product_fresh(product_id).await {
            Ok(product) => product,
            Err(BackendError::NotFound(_)) => {
                return Err(CartServiceError::Unavailable(product_id.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        if !product.is_active {
            return Err(CartServiceError::Unavailable(product_id.clone()));
        }
        Ok(product)
    }

    async fn guest_cart(&self) -> Result<Cart, CartServiceError> {
        Ok(self
            .session
            .get::<Cart>(session_keys::GUEST_CART)
            .await?
            .unwrap_or_default())
    }

    async fn save_guest_cart(&self, cart: &Cart) -> Result<(), CartServiceError> {
        if cart.is_empty() {
            self.session
                .remove::<Cart>(session_keys::GUEST_CART)
                .await?;
        } else {
            self.session.insert(session_keys::GUEST_CART, cart).await?;
        }
        Ok(())
    }
}
