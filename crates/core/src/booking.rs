//! Personal-trainer booking slots.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BookingId, BookingStatus};

/// Bookings must be made at least this far ahead.
pub const MIN_LEAD_TIME_MINUTES: i64 = 60;
pub const MIN_SESSION_MINUTES: u32 = 30;
pub const MAX_SESSION_MINUTES: u32 = 120;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("slot is in the past")]
    InPast,
    #[error("slots must be booked at least an hour ahead")]
    TooSoon,
    #[error("trainer is not available at that time")]
    OutsideAvailability,
    #[error("sessions last between 30 and 120 minutes")]
    InvalidDuration,
    #[error("overlaps existing booking {booking_id}")]
    Overlaps { booking_id: BookingId },
}

/// A requested session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSlot {
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: u32,
}

impl BookingSlot {
    #[must_use]
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.starts_at + Duration::minutes(i64::from(self.duration_minutes))
    }

    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.starts_at < other.ends_at() && other.starts_at < self.ends_at()
    }
}

/// Daily working hours of a trainer, in UTC hours `[start_hour, end_hour)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Availability {
    /// Whether the whole slot falls inside working hours on its day.
    #[must_use]
    pub fn contains(&self, slot: &BookingSlot) -> bool {
        let start = slot.starts_at;
        let end = slot.ends_at();
        if start.date_naive() != end.date_naive() && end.time().num_seconds_from_midnight() != 0 {
            return false;
        }
        let start_minutes = start.hour() * 60 + start.minute();
        let end_minutes = if start.date_naive() == end.date_naive() {
            end.hour() * 60 + end.minute()
        } else {
            24 * 60
        };
        start_minutes >= self.start_hour * 60 && end_minutes <= self.end_hour * 60
    }
}

/// A booking the member already holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingBooking {
    pub id: BookingId,
    pub slot: BookingSlot,
    pub status: BookingStatus,
}

/// Validate a requested slot before sending it to the backend.
///
/// # Errors
///
/// Returns the first failing [`BookingError`].
pub fn validate_slot(
    slot: &BookingSlot,
    availability: Option<&Availability>,
    existing: &[ExistingBooking],
    now: DateTime<Utc>,
) -> Result<(), BookingError> {
    if !(MIN_SESSION_MINUTES..=MAX_SESSION_MINUTES).contains(&slot.duration_minutes) {
        return Err(BookingError::InvalidDuration);
    }
    if slot.starts_at <= now {
        return Err(BookingError::InPast);
    }
    if slot.starts_at < now + Duration::minutes(MIN_LEAD_TIME_MINUTES) {
        return Err(BookingError::TooSoon);
    }
    if let Some(hours) = availability
        && !hours.contains(slot)
    {
        return Err(BookingError::OutsideAvailability);
    }
    if let Some(clash) = existing
        .iter()
        .find(|b| b.status.holds_slot() && b.slot.overlaps(slot))
    {
        return Err(BookingError::Overlaps {
            booking_id: clash.id.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
    }

    fn slot(hour: u32, minute: u32, duration: u32) -> BookingSlot {
        BookingSlot {
            starts_at: Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap(),
            duration_minutes: duration,
        }
    }

    const HOURS: Availability = Availability {
        start_hour: 6,
        end_hour: 21,
    };

    #[test]
    fn test_valid_slot() {
        assert!(validate_slot(&slot(10, 0, 60), Some(&HOURS), &[], now()).is_ok());
    }

    #[test]
    fn test_lead_time_and_past() {
        assert_eq!(
            validate_slot(&slot(7, 0, 60), Some(&HOURS), &[], now()),
            Err(BookingError::InPast)
        );
        assert_eq!(
            validate_slot(&slot(8, 30, 60), Some(&HOURS), &[], now()),
            Err(BookingError::TooSoon)
        );
    }

    #[test]
    fn test_duration_bounds() {
        assert_eq!(
            validate_slot(&slot(12, 0, 15), None, &[], now()),
            Err(BookingError::InvalidDuration)
        );
        assert_eq!(
            validate_slot(&slot(12, 0, 180), None, &[], now()),
            Err(BookingError::InvalidDuration)
        );
    }

    #[test]
    fn test_outside_hours() {
        assert_eq!(
            validate_slot(&slot(20, 30, 60), Some(&HOURS), &[], now()),
            Err(BookingError::OutsideAvailability)
        );
        assert!(validate_slot(&slot(20, 0, 60), Some(&HOURS), &[], now()).is_ok());
    }

    #[test]
    fn test_overlap_ignores_cancelled() {
        let existing = vec![
            ExistingBooking {
                id: BookingId::new("b1"),
                slot: slot(10, 0, 60),
                status: BookingStatus::Cancelled,
            },
            ExistingBooking {
                id: BookingId::new("b2"),
                slot: slot(11, 0, 60),
                status: BookingStatus::Confirmed,
            },
        ];
        assert!(validate_slot(&slot(10, 0, 60), Some(&HOURS), &existing, now()).is_ok());
        assert_eq!(
            validate_slot(&slot(11, 30, 60), Some(&HOURS), &existing, now()),
            Err(BookingError::Overlaps {
                booking_id: BookingId::new("b2")
            })
        );
    }
}
