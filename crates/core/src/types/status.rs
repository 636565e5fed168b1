//! Status enums for various entities.
//!
//! The backend stores most of these as strings; serde renames keep the wire
//! form stable.

use serde::{Deserialize, Serialize};

/// Role attached to an authenticated account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular gym member / shop customer.
    #[default]
    #[serde(alias = "user")]
    Member,
    /// Personal trainer with a bookable profile.
    Trainer,
    /// Back-office administrator.
    Admin,
}

impl UserRole {
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Member => write!(f, "member"),
            Self::Trainer => write!(f, "trainer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "member" | "user" => Ok(Self::Member),
            "trainer" => Ok(Self::Trainer),
            "admin" => Ok(Self::Admin),
            other => Err(format!("invalid user role: {other}")),
        }
    }
}

/// Order lifecycle as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Payment order created, awaiting payment.
    #[default]
    Created,
    Paid,
    Failed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Whether the order contributes to revenue.
    #[must_use]
    pub const fn is_revenue(self) -> bool {
        matches!(self, Self::Paid)
    }
}

/// Trainer booking lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Whether the booking still occupies its slot.
    #[must_use]
    pub const fn holds_slot(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

/// Membership state relative to a point in time. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Upcoming,
    Active,
    Expired,
}

/// Kind of admin-managed content record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Logo,
    Video,
    Image,
    Event,
    #[default]
    Text,
}

/// Realtime change notifications pushed by the backend.
///
/// String forms match the backend's event names exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    ProductChanges,
    CartUpdates,
    MembershipPlanChanges,
}

impl ChangeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProductChanges => "ProductChanges",
            Self::CartUpdates => "CartUpdates",
            Self::MembershipPlanChanges => "MembershipPlanChanges",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChangeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ProductChanges" => Ok(Self::ProductChanges),
            "CartUpdates" => Ok(Self::CartUpdates),
            "MembershipPlanChanges" => Ok(Self::MembershipPlanChanges),
            other => Err(format!("unknown change event: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_parsing() {
        assert_eq!("Admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("user".parse::<UserRole>().unwrap(), UserRole::Member);
        assert!("owner".parse::<UserRole>().is_err());
        assert_eq!(UserRole::Trainer.to_string(), "trainer");
    }

    #[test]
    fn test_change_kind_names_match_events() {
        for kind in [
            ChangeKind::ProductChanges,
            ChangeKind::CartUpdates,
            ChangeKind::MembershipPlanChanges,
        ] {
            assert_eq!(kind.as_str().parse::<ChangeKind>().unwrap(), kind);
            assert_eq!(
                serde_json::to_string(&kind).unwrap(),
                format!("\"{}\"", kind.as_str())
            );
        }
    }

    #[test]
    fn test_booking_holds_slot() {
        assert!(BookingStatus::Pending.holds_slot());
        assert!(BookingStatus::Confirmed.holds_slot());
        assert!(!BookingStatus::Cancelled.holds_slot());
        assert!(!BookingStatus::Completed.holds_slot());
    }
}
