//! Business logic services for storefront.
//!
//! Services borrow the backend client (and the session where needed) for one
//! request. Route handlers build them on the stack.
//!
//! # Services
//!
//! - `auth` - Signup, OTP verification, login, password reset
//! - `cart` - Guest and member carts, merge on login
//! - `checkout` - Stock locks, payment orders, membership purchase
//! - `booking` - Trainer slot validation and booking
//! - `dashboard` - Admin aggregates
//! - `content` - Homepage resources

pub mod auth;
pub mod booking;
pub mod cart;
pub mod checkout;
pub mod content;
pub mod dashboard;

pub use auth::{AuthError, AuthService, SignupInput};
pub use booking::{BookingInput, BookingService, BookingServiceError};
pub use cart::{CartService, CartServiceError, MergeOutcome};
pub use checkout::{
    CheckoutError, CheckoutService, ConfirmedOrder, PaymentConfirmation, PaymentIntent,
};
pub use content::{ContentService, HomepageContent};
pub use dashboard::{DashboardService, DashboardSummary};
