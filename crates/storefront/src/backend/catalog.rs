//! Products, stock locks and membership plans.

use std::sync::Arc;

use ironhouse_core::{ChangeKind, PlanId, ProductId, UserId};
use reqwest::Method;
use tracing::instrument;

use super::cache::{CacheKey, CacheValue};
use super::types::{
    AccessToken, LockRequest, MembershipPlan, PlanInput, Product, ProductInput, StockLock,
};
use super::{BackendError, GymApiClient};

impl GymApiClient {
    // =========================================================================
    // Products
    // =========================================================================

    /// All products, active or not. Cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_products(&self) -> Result<Arc<Vec<Product>>, BackendError> {
        if let Some(CacheValue::Products(products)) = self.cached(&CacheKey::Products).await {
            tracing::debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Arc<Vec<Product>> =
            Arc::new(self.get_json(&["api", "products", "AllProducts"], None).await?);
        self.remember(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// A single product. Cached.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` for unknown IDs.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.cached(&key).await {
            tracing::debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self
            .get_json(&["api", "products", id.as_str()], None)
            .await?;
        self.remember(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// A product with fresh stock, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` for unknown IDs.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product_fresh(&self, id: &ProductId) -> Result<Product, BackendError> {
        let product: Product = self
            .get_json(&["api", "products", id.as_str()], None)
            .await?;
        self.remember(
            CacheKey::Product(id.clone()),
            CacheValue::Product(Box::new(product.clone())),
        )
        .await;
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the product.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        token: &AccessToken,
        input: &ProductInput,
    ) -> Result<Product, BackendError> {
        let product = self
            .send_json(Method::POST, &["api", "products"], Some(token), input)
            .await?;
        self.apply_change(ChangeKind::ProductChanges);
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, token, input), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &AccessToken,
        id: &ProductId,
        input: &ProductInput,
    ) -> Result<Product, BackendError> {
        let product = self
            .send_json(Method::PUT, &["api", "products", id.as_str()], Some(token), input)
            .await?;
        self.apply_change(ChangeKind::ProductChanges);
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns an error if the product cannot be deleted.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(
        &self,
        token: &AccessToken,
        id: &ProductId,
    ) -> Result<(), BackendError> {
        self.send_unit(
            Method::DELETE,
            &["api", "products", id.as_str()],
            Some(token),
            None::<&()>,
        )
        .await?;
        self.apply_change(ChangeKind::ProductChanges);
        Ok(())
    }

    // =========================================================================
    // Stock locks
    // =========================================================================

    /// Reserve `quantity` units of a product for a pending payment.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` or `Rejected` when stock cannot be reserved.
    #[instrument(skip(self, token), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn lock_stock(
        &self,
        token: &AccessToken,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<StockLock, BackendError> {
        self.send_json(
            Method::POST,
            &["api", "products", "LockStock", product_id.as_str()],
            Some(token),
            &LockRequest { user_id, quantity },
        )
        .await
    }

    /// Release a reservation made by [`Self::lock_stock`].
    ///
    /// # Errors
    ///
    /// Returns an error if the backend could not release the lock.
    #[instrument(skip(self, token), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn release_lock(
        &self,
        token: &AccessToken,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        self.send_unit(
            Method::POST,
            &["api", "products", "ReleaseLock", product_id.as_str()],
            Some(token),
            Some(&LockRequest { user_id, quantity }),
        )
        .await
    }

    // =========================================================================
    // Membership plans
    // =========================================================================

    /// All membership plans. Cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_plans(&self) -> Result<Arc<Vec<MembershipPlan>>, BackendError> {
        if let Some(CacheValue::Plans(plans)) = self.cached(&CacheKey::Plans).await {
            return Ok(plans);
        }

        let plans: Arc<Vec<MembershipPlan>> =
            Arc::new(self.get_json(&["api", "MembershipPlans"], None).await?);
        self.remember(CacheKey::Plans, CacheValue::Plans(Arc::clone(&plans)))
            .await;
        Ok(plans)
    }

    /// A single plan. Cached.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` for unknown IDs.
    #[instrument(skip(self), fields(plan_id = %id))]
    pub async fn get_plan(&self, id: &PlanId) -> Result<MembershipPlan, BackendError> {
        let key = CacheKey::Plan(id.clone());
        if let Some(CacheValue::Plan(plan)) = self.cached(&key).await {
            return Ok(*plan);
        }

        let plan: MembershipPlan = self
            .get_json(&["api", "MembershipPlans", id.as_str()], None)
            .await?;
        self.remember(key, CacheValue::Plan(Box::new(plan.clone())))
            .await;
        Ok(plan)
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the plan.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_plan(
        &self,
        token: &AccessToken,
        input: &PlanInput,
    ) -> Result<MembershipPlan, BackendError> {
        let plan = self
            .send_json(Method::POST, &["api", "MembershipPlans"], Some(token), input)
            .await?;
        self.apply_change(ChangeKind::MembershipPlanChanges);
        Ok(plan)
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, token, input), fields(plan_id = %id))]
    pub async fn update_plan(
        &self,
        token: &AccessToken,
        id: &PlanId,
        input: &PlanInput,
    ) -> Result<MembershipPlan, BackendError> {
        let plan = self
            .send_json(
                Method::PUT,
                &["api", "MembershipPlans", id.as_str()],
                Some(token),
                input,
            )
            .await?;
        self.apply_change(ChangeKind::MembershipPlanChanges);
        Ok(plan)
    }

    /// # Errors
    ///
    /// Returns an error if the plan cannot be deleted.
    #[instrument(skip(self, token), fields(plan_id = %id))]
    pub async fn delete_plan(&self, token: &AccessToken, id: &PlanId) -> Result<(), BackendError> {
        self.send_unit(
            Method::DELETE,
            &["api", "MembershipPlans", id.as_str()],
            Some(token),
            None::<&()>,
        )
        .await?;
        self.apply_change(ChangeKind::MembershipPlanChanges);
        Ok(())
    }
}
