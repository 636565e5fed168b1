//! Payment orders, placed orders and memberships.

use ironhouse_core::UserId;
use reqwest::Method;
use tracing::instrument;

use super::types::{
    AccessToken, CreateOrderRequest, Membership, Order, PaymentOrder, PaymentVerification,
    PlanOrderRequest, SubscribeRequest, VerifyPaymentRequest,
};
use super::{BackendError, GymApiClient};

impl GymApiClient {
    /// Create a gateway order for a set of cart lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend or the gateway rejects the order.
    #[instrument(skip(self, token, request), fields(user_id = %request.user_id, amount = request.amount))]
    pub async fn create_order(
        &self,
        token: &AccessToken,
        request: &CreateOrderRequest<'_>,
    ) -> Result<PaymentOrder, BackendError> {
        self.send_json(
            Method::POST,
            &["api", "Payment", "create-order-multiple"],
            Some(token),
            request,
        )
        .await
    }

    /// Create a gateway order for a membership plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend or the gateway rejects the order.
    #[instrument(skip(self, token, request), fields(user_id = %request.user_id, plan_id = %request.plan_id))]
    pub async fn create_plan_order(
        &self,
        token: &AccessToken,
        request: &PlanOrderRequest<'_>,
    ) -> Result<PaymentOrder, BackendError> {
        self.send_json(
            Method::POST,
            &["api", "Payment", "create-order-plan"],
            Some(token),
            request,
        )
        .await
    }

    /// Forward the gateway's payment signature for verification.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails. A bad signature is reported
    /// either as `Rejected` or as `verified: false`.
    #[instrument(skip(self, token, request), fields(order_id = %request.order_id))]
    pub async fn verify_payment(
        &self,
        token: &AccessToken,
        request: &VerifyPaymentRequest<'_>,
    ) -> Result<PaymentVerification, BackendError> {
        self.send_json(
            Method::POST,
            &["api", "Payment", "verify-payment"],
            Some(token),
            request,
        )
        .await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(user_id = %user_id))]
    pub async fn get_user_orders(
        &self,
        token: &AccessToken,
        user_id: &UserId,
    ) -> Result<Vec<Order>, BackendError> {
        self.get_json(&["api", "Orders", "user", user_id.as_str()], Some(token))
            .await
    }

    /// Every order in the system (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn get_all_orders(&self, token: &AccessToken) -> Result<Vec<Order>, BackendError> {
        self.get_json(&["api", "Orders"], Some(token)).await
    }

    // =========================================================================
    // Memberships
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the backend rejects the subscription.
    #[instrument(skip(self, token, request), fields(user_id = %request.user_id, plan_id = %request.plan_id))]
    pub async fn subscribe(
        &self,
        token: &AccessToken,
        request: &SubscribeRequest<'_>,
    ) -> Result<Membership, BackendError> {
        self.send_json(
            Method::POST,
            &["api", "Membership", "subscribe"],
            Some(token),
            request,
        )
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(user_id = %user_id))]
    pub async fn get_memberships(
        &self,
        token: &AccessToken,
        user_id: &UserId,
    ) -> Result<Vec<Membership>, BackendError> {
        self.get_json(&["api", "Membership", "user", user_id.as_str()], Some(token))
            .await
    }
}
