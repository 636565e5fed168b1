//! Trainers and personal-training bookings.

use std::sync::Arc;

use ironhouse_core::{BookingId, TrainerId, UserId};
use reqwest::Method;
use tracing::instrument;

use super::cache::{CacheKey, CacheValue};
use super::types::{AccessToken, BookRequest, Booking, Trainer};
use super::{BackendError, GymApiClient};

impl GymApiClient {
    /// All trainers. Cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_trainers(&self) -> Result<Arc<Vec<Trainer>>, BackendError> {
        if let Some(CacheValue::Trainers(trainers)) = self.cached(&CacheKey::Trainers).await {
            return Ok(trainers);
        }

        let trainers: Arc<Vec<Trainer>> =
            Arc::new(self.get_json(&["api", "Trainers"], None).await?);
        self.remember(CacheKey::Trainers, CacheValue::Trainers(Arc::clone(&trainers)))
            .await;
        Ok(trainers)
    }

    /// A single trainer. Cached.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` for unknown IDs.
    #[instrument(skip(self), fields(trainer_id = %id))]
    pub async fn get_trainer(&self, id: &TrainerId) -> Result<Trainer, BackendError> {
        let key = CacheKey::Trainer(id.clone());
        if let Some(CacheValue::Trainer(trainer)) = self.cached(&key).await {
            return Ok(*trainer);
        }

        let trainer: Trainer = self
            .get_json(&["api", "Trainers", id.as_str()], None)
            .await?;
        self.remember(key, CacheValue::Trainer(Box::new(trainer.clone())))
            .await;
        Ok(trainer)
    }

    /// # Errors
    ///
    /// Returns `Conflict` if the trainer is already booked for the slot.
    #[instrument(skip(self, token, request), fields(trainer_id = %trainer_id))]
    pub async fn book_trainer(
        &self,
        token: &AccessToken,
        trainer_id: &TrainerId,
        request: &BookRequest<'_>,
    ) -> Result<Booking, BackendError> {
        self.send_json(
            Method::POST,
            &["api", "Trainers", trainer_id.as_str(), "book"],
            Some(token),
            request,
        )
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(user_id = %user_id))]
    pub async fn get_user_bookings(
        &self,
        token: &AccessToken,
        user_id: &UserId,
    ) -> Result<Vec<Booking>, BackendError> {
        self.get_json(&["api", "Bookings", "user", user_id.as_str()], Some(token))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the booking cannot be cancelled.
    #[instrument(skip(self, token), fields(booking_id = %id))]
    pub async fn cancel_booking(
        &self,
        token: &AccessToken,
        id: &BookingId,
    ) -> Result<(), BackendError> {
        self.send_unit(
            Method::DELETE,
            &["api", "Bookings", id.as_str()],
            Some(token),
            None::<&()>,
        )
        .await
    }
}
