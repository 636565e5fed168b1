//! Membership periods.
//!
//! A membership is a plan bought for a fixed number of days. Buying again
//! while a membership is still running extends it: the new period starts when
//! the current one ends.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::MembershipStatus;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MembershipError {
    #[error("plan duration must be at least one day")]
    InvalidDuration,
}

/// The time window a membership covers. `ends_at` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipPeriod {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl MembershipPeriod {
    /// A period of `duration_days` beginning at `starts_at`.
    ///
    /// # Errors
    ///
    /// Returns `MembershipError::InvalidDuration` when `duration_days` is 0.
    pub fn starting(starts_at: DateTime<Utc>, duration_days: u32) -> Result<Self, MembershipError> {
        if duration_days == 0 {
            return Err(MembershipError::InvalidDuration);
        }
        Ok(Self {
            starts_at,
            ends_at: starts_at + Duration::days(i64::from(duration_days)),
        })
    }

    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> MembershipStatus {
        if now < self.starts_at {
            MembershipStatus::Upcoming
        } else if now < self.ends_at {
            MembershipStatus::Active
        } else {
            MembershipStatus::Expired
        }
    }

    /// Whole days left, rounded up. Zero once expired.
    #[must_use]
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        let from = now.max(self.starts_at);
        let remaining = self.ends_at - from;
        if remaining <= Duration::zero() {
            return 0;
        }
        let days = remaining.num_days();
        if remaining > Duration::days(days) {
            days + 1
        } else {
            days
        }
    }
}

/// Where a newly purchased period should start.
///
/// Stacks onto the latest period that has not yet expired.
#[must_use]
pub fn renewal_start(existing: &[MembershipPeriod], now: DateTime<Utc>) -> DateTime<Utc> {
    existing
        .iter()
        .filter(|p| p.status_at(now) != MembershipStatus::Expired)
        .map(|p| p.ends_at)
        .max()
        .map_or(now, |end| end.max(now))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(days: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap() + Duration::days(days)
    }

    #[test]
    fn test_zero_duration_rejected() {
        assert_eq!(
            MembershipPeriod::starting(at(0), 0),
            Err(MembershipError::InvalidDuration)
        );
    }

    #[test]
    fn test_status_transitions() {
        let period = MembershipPeriod::starting(at(10), 30).unwrap();
        assert_eq!(period.status_at(at(5)), MembershipStatus::Upcoming);
        assert_eq!(period.status_at(at(10)), MembershipStatus::Active);
        assert_eq!(period.status_at(at(39)), MembershipStatus::Active);
        assert_eq!(period.status_at(at(40)), MembershipStatus::Expired);
    }

    #[test]
    fn test_days_remaining_rounds_up() {
        let period = MembershipPeriod::starting(at(0), 30).unwrap();
        assert_eq!(period.days_remaining(at(0)), 30);
        assert_eq!(
            period.days_remaining(at(29) + Duration::hours(1)),
            1
        );
        assert_eq!(period.days_remaining(at(31)), 0);
    }

    #[test]
    fn test_renewal_stacks_on_active_membership() {
        let current = MembershipPeriod::starting(at(0), 30).unwrap();
        assert_eq!(renewal_start(&[current], at(20)), at(30));
    }

    #[test]
    fn test_renewal_ignores_expired() {
        let old = MembershipPeriod::starting(at(0), 30).unwrap();
        assert_eq!(renewal_start(&[old], at(45)), at(45));
        assert_eq!(renewal_start(&[], at(3)), at(3));
    }

    #[test]
    fn test_renewal_stacks_after_upcoming() {
        let current = MembershipPeriod::starting(at(0), 30).unwrap();
        let queued = MembershipPeriod::starting(at(30), 90).unwrap();
        assert_eq!(renewal_start(&[current, queued], at(10)), at(120));
    }
}
