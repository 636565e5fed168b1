//! Newtype IDs for type-safe entity references.
//!
//! The gym backend issues opaque string identifiers for every entity. Use the
//! `define_id!` macro to wrap them so IDs from different entity types cannot be
//! mixed up when building backend paths.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use ironhouse_core::define_id;
/// define_id!(MemberId);
/// define_id!(LockerId);
///
/// let member = MemberId::new("m-1");
/// let locker = LockerId::new("m-1");
///
/// // These are different types, so this won't compile:
/// // let _: MemberId = locker;
/// assert_eq!(member.as_str(), locker.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a backend identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the identifier.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(UserId);
define_id!(ProductId);
define_id!(PlanId);
define_id!(TrainerId);
define_id!(OrderId);
define_id!(BookingId);
define_id!(ResourceId);
define_id!(DiscountId);
define_id!(LockId);
define_id!(PaymentOrderId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_transparently() {
        let id = ProductId::new("65f0c2a1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"65f0c2a1\"");

        let back: ProductId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_display_matches_inner() {
        let id = UserId::from("user-42");
        assert_eq!(id.to_string(), "user-42");
        assert_eq!(id.into_inner(), "user-42");
    }
}
