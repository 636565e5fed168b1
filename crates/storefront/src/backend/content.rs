//! Resources, discount codes and the user directory.

use std::sync::Arc;

use ironhouse_core::{DiscountId, ResourceId};
use reqwest::Method;
use tracing::instrument;

use super::cache::{CacheKey, CacheValue};
use super::types::{AccessToken, Discount, DiscountInput, Resource, ResourceInput, User};
use super::{BackendError, GymApiClient};

impl GymApiClient {
    // =========================================================================
    // Resources
    // =========================================================================

    /// All content resources. Cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_resources(&self) -> Result<Arc<Vec<Resource>>, BackendError> {
        if let Some(CacheValue::Resources(resources)) = self.cached(&CacheKey::Resources).await {
            return Ok(resources);
        }

        let resources: Arc<Vec<Resource>> =
            Arc::new(self.get_json(&["api", "Resources"], None).await?);
        self.remember(
            CacheKey::Resources,
            CacheValue::Resources(Arc::clone(&resources)),
        )
        .await;
        Ok(resources)
    }

    /// A resource by its title (e.g. `logo`, `footer`). Cached.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` when no resource has that title.
    #[instrument(skip(self))]
    pub async fn get_resource_by_title(&self, title: &str) -> Result<Resource, BackendError> {
        let key = CacheKey::Resource(title.to_string());
        if let Some(CacheValue::Resource(resource)) = self.cached(&key).await {
            return Ok(*resource);
        }

        let resource: Resource = self
            .get_json(&["api", "Resources", "title", title], None)
            .await?;
        self.remember(key, CacheValue::Resource(Box::new(resource.clone())))
            .await;
        Ok(resource)
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the resource.
    #[instrument(skip(self, token, input), fields(title = %input.title))]
    pub async fn create_resource(
        &self,
        token: &AccessToken,
        input: &ResourceInput,
    ) -> Result<Resource, BackendError> {
        let resource = self
            .send_json(Method::POST, &["api", "Resources"], Some(token), input)
            .await?;
        self.invalidate_content();
        Ok(resource)
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, token, input), fields(resource_id = %id))]
    pub async fn update_resource(
        &self,
        token: &AccessToken,
        id: &ResourceId,
        input: &ResourceInput,
    ) -> Result<Resource, BackendError> {
        let resource = self
            .send_json(Method::PUT, &["api", "Resources", id.as_str()], Some(token), input)
            .await?;
        self.invalidate_content();
        Ok(resource)
    }

    /// # Errors
    ///
    /// Returns an error if the resource cannot be deleted.
    #[instrument(skip(self, token), fields(resource_id = %id))]
    pub async fn delete_resource(
        &self,
        token: &AccessToken,
        id: &ResourceId,
    ) -> Result<(), BackendError> {
        self.send_unit(
            Method::DELETE,
            &["api", "Resources", id.as_str()],
            Some(token),
            None::<&()>,
        )
        .await?;
        self.invalidate_content();
        Ok(())
    }

    fn invalidate_content(&self) {
        self.invalidate_where(|key| matches!(key, CacheKey::Resources | CacheKey::Resource(_)));
    }

    // =========================================================================
    // Discounts (never cached: usage counts change on every order)
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn get_discounts(&self, token: &AccessToken) -> Result<Vec<Discount>, BackendError> {
        self.get_json(&["api", "Discounts"], Some(token)).await
    }

    /// Look up a code as typed at checkout. Guests may preview codes too.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` for unknown codes.
    #[instrument(skip(self, token))]
    pub async fn get_discount_by_code(
        &self,
        token: Option<&AccessToken>,
        code: &str,
    ) -> Result<Discount, BackendError> {
        self.get_json(&["api", "Discounts", "code", code], token)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the discount.
    #[instrument(skip(self, token, input), fields(code = %input.code))]
    pub async fn create_discount(
        &self,
        token: &AccessToken,
        input: &DiscountInput,
    ) -> Result<Discount, BackendError> {
        self.send_json(Method::POST, &["api", "Discounts"], Some(token), input)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, token, input), fields(discount_id = %id))]
    pub async fn update_discount(
        &self,
        token: &AccessToken,
        id: &DiscountId,
        input: &DiscountInput,
    ) -> Result<Discount, BackendError> {
        self.send_json(Method::PUT, &["api", "Discounts", id.as_str()], Some(token), input)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the discount cannot be deleted.
    #[instrument(skip(self, token), fields(discount_id = %id))]
    pub async fn delete_discount(
        &self,
        token: &AccessToken,
        id: &DiscountId,
    ) -> Result<(), BackendError> {
        self.send_unit(
            Method::DELETE,
            &["api", "Discounts", id.as_str()],
            Some(token),
            None::<&()>,
        )
        .await
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Every registered user (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn get_users(&self, token: &AccessToken) -> Result<Vec<User>, BackendError> {
        self.get_json(&["api", "users"], Some(token)).await
    }
}
