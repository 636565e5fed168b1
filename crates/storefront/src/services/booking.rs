//! Personal-trainer bookings.

use chrono::{DateTime, Utc};
use ironhouse_core::booking::{BookingError, BookingSlot, ExistingBooking, validate_slot};
use ironhouse_core::{BookingId, TrainerId};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::backend::{BackendError, BookRequest, Booking, GymApiClient, Trainer};
use crate::models::CurrentUser;

/// Maximum length of booking notes.
const MAX_NOTES_LENGTH: usize = 500;

#[derive(Debug, Error)]
pub enum BookingServiceError {
    #[error(transparent)]
    Slot(#[from] BookingError),

    #[error("trainer not found")]
    TrainerNotFound(TrainerId),

    #[error("booking not found")]
    NotFound(BookingId),

    /// Past or already cancelled.
    #[error("this booking can no longer be cancelled")]
    NotCancellable,

    #[error("notes are limited to 500 characters")]
    NotesTooLong,

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// A booking request from a member.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingInput {
    pub trainer_id: TrainerId,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

pub struct BookingService<'a> {
    backend: &'a GymApiClient,
}

impl<'a> BookingService<'a> {
    #[must_use]
    pub const fn new(backend: &'a GymApiClient) -> Self {
        Self { backend }
    }

    /// # Errors
    ///
    /// Returns an error if the trainers cannot be loaded.
    pub async fn trainers(&self) -> Result<Vec<Trainer>, BookingServiceError> {
        Ok(self.backend.get_trainers().await?.as_ref().clone())
    }

    /// # Errors
    ///
    /// Returns `TrainerNotFound` for unknown trainers.
    pub async fn trainer(&self, id: &TrainerId) -> Result<Trainer, BookingServiceError> {
        self.backend.get_trainer(id).await.map_err(|e| match e {
            BackendError::NotFound(_) => BookingServiceError::TrainerNotFound(id.clone()),
            other => other.into(),
        })
    }

    /// The member's bookings, soonest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the bookings cannot be loaded.
    pub async fn list(&self, user: &CurrentUser) -> Result<Vec<Booking>, BookingServiceError> {
        let mut bookings = self.backend.get_user_bookings(&user.token, &user.id).await?;
        bookings.sort_by_key(|b| b.starts_at);
        Ok(bookings)
    }

    /// Book a session after checking the slot locally.
    ///
    /// # Errors
    ///
    /// Returns a `Slot` error when the slot is invalid for the trainer's
    /// hours or clashes with one of the member's bookings.
    #[instrument(skip(self, user, input), fields(user_id = %user.id, trainer_id = %input.trainer_id))]
    pub async fn create(
        &self,
        user: &CurrentUser,
        input: &BookingInput,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingServiceError> {
        let notes = input
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        if notes.is_some_and(|n| n.chars().count() > MAX_NOTES_LENGTH) {
            return Err(BookingServiceError::NotesTooLong);
        }

        let trainer = self.trainer(&input.trainer_id).await?;
        let existing: Vec<ExistingBooking> = self
            .backend
            .get_user_bookings(&user.token, &user.id)
            .await?
            .iter()
            .map(Booking::to_existing)
            .collect();

        let slot = BookingSlot {
            starts_at: input.starts_at,
            duration_minutes: input.duration_minutes,
        };
        let availability = trainer.availability.map(Into::into);
        validate_slot(&slot, availability.as_ref(), &existing, now)?;

        let booking = self
            .backend
            .book_trainer(
                &user.token,
                &trainer.id,
                &BookRequest {
                    user_id: &user.id,
                    starts_at: slot.starts_at,
                    duration_minutes: slot.duration_minutes,
                    notes,
                },
            )
            .await?;

        tracing::info!(booking_id = %booking.id, starts_at = %booking.starts_at, "Trainer booked");
        Ok(booking)
    }

    /// Cancel one of the member's upcoming bookings.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the booking is not the member's, or
    /// `NotCancellable` for past or cancelled bookings.
    #[instrument(skip(self, user), fields(user_id = %user.id, booking_id = %id))]
    pub async fn cancel(
        &self,
        user: &CurrentUser,
        id: &BookingId,
        now: DateTime<Utc>,
    ) -> Result<(), BookingServiceError> {
        let bookings = self.backend.get_user_bookings(&user.token, &user.id).await?;
        let booking = bookings
            .iter()
            .find(|b| &b.id == id)
            .ok_or_else(|| BookingServiceError::NotFound(id.clone()))?;
        if !is_cancellable(booking, now) {
            return Err(BookingServiceError::NotCancellable);
        }

        self.backend.cancel_booking(&user.token, id).await?;
        tracing::info!("Booking cancelled");
        Ok(())
    }
}

fn is_cancellable(booking: &Booking, now: DateTime<Utc>) -> bool {
    booking.status.holds_slot() && booking.starts_at > now
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};
    use ironhouse_core::{BookingStatus, UserId};

    use super::*;

    fn booking(starts_at: DateTime<Utc>, status: BookingStatus) -> Booking {
        Booking {
            id: BookingId::new("b1"),
            trainer_id: TrainerId::new("t1"),
            trainer_name: None,
            user_id: UserId::new("u1"),
            starts_at,
            duration_minutes: 60,
            status,
            notes: None,
        }
    }

    #[test]
    fn test_only_upcoming_live_bookings_cancel() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        let later = now + Duration::days(1);
        let earlier = now - Duration::hours(1);

        assert!(is_cancellable(&booking(later, BookingStatus::Confirmed), now));
        assert!(is_cancellable(&booking(later, BookingStatus::Pending), now));
        assert!(!is_cancellable(&booking(later, BookingStatus::Cancelled), now));
        assert!(!is_cancellable(&booking(earlier, BookingStatus::Confirmed), now));
        assert!(!is_cancellable(&booking(now, BookingStatus::Confirmed), now));
    }

    #[test]
    fn test_booking_input_from_json() {
        let input: BookingInput = serde_json::from_str(
            r#"{"trainer_id":"t1","starts_at":"2026-03-03T10:00:00Z","duration_minutes":60}"#,
        )
        .unwrap();
        assert_eq!(input.trainer_id, TrainerId::new("t1"));
        assert!(input.notes.is_none());
    }
}
