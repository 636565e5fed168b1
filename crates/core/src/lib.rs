//! Ironhouse Core - Shared domain types and rules.
//!
//! This crate provides the types used across the Ironhouse components:
//! - `storefront` - JSON storefront server in front of the gym backend
//! - `integration-tests` - End-to-end tests against a stub backend
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP clients. The gym backend owns every entity; the rules here
//! decide what is worth sending to it.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, OTP codes, prices and statuses
//! - [`cart`] - Cart lines, quantity limits, merging
//! - [`discount`] - Discount code validation and totals
//! - [`membership`] - Membership periods and stacked renewals
//! - [`booking`] - Trainer booking slot validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod booking;
pub mod cart;
pub mod discount;
pub mod membership;
pub mod types;

pub use types::*;
