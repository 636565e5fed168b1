//! Types the storefront keeps in the session.

pub mod session;

pub use session::{CurrentUser, HeldLock, PendingCheckout, PendingPlanCheckout, keys as session_keys};
