//! The backend copy of a member's cart. Never cached.

use ironhouse_core::{ProductId, UserId};
use reqwest::Method;
use tracing::instrument;

use super::types::{AccessToken, BackendCart, QuantityRequest};
use super::{BackendError, GymApiClient};

impl GymApiClient {
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(user_id = %user_id))]
    pub async fn get_cart(
        &self,
        token: &AccessToken,
        user_id: &UserId,
    ) -> Result<BackendCart, BackendError> {
        self.get_json(&["api", "Cart", user_id.as_str()], Some(token))
            .await
    }

    /// Add `quantity` units; the backend sums with any existing line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the change.
    #[instrument(skip(self, token), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        token: &AccessToken,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        self.send_unit(
            Method::POST,
            &["api", "Cart", "AddToCart", user_id.as_str(), product_id.as_str()],
            Some(token),
            Some(&QuantityRequest { quantity }),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the change.
    #[instrument(skip(self, token), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn update_cart_quantity(
        &self,
        token: &AccessToken,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        self.send_unit(
            Method::PUT,
            &["api", "Cart", "UpdateQuantity", user_id.as_str(), product_id.as_str()],
            Some(token),
            Some(&QuantityRequest { quantity }),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn remove_from_cart(
        &self,
        token: &AccessToken,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<(), BackendError> {
        self.send_unit(
            Method::DELETE,
            &["api", "Cart", "RemoveFromCart", user_id.as_str(), product_id.as_str()],
            Some(token),
            None::<&()>,
        )
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(user_id = %user_id))]
    pub async fn clear_cart(&self, token: &AccessToken, user_id: &UserId) -> Result<(), BackendError> {
        self.send_unit(
            Method::DELETE,
            &["api", "Cart", "ClearCart", user_id.as_str()],
            Some(token),
            None::<&()>,
        )
        .await
    }
}
