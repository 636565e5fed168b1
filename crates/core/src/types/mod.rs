//! Core types for Ironhouse.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod otp;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use otp::{OtpCode, OtpError, OtpPurpose};
pub use price::{CurrencyCode, Price, PriceError};
pub use status::*;
