//! Client for the gym REST backend.
//!
//! # Architecture
//!
//! - The backend is the source of truth for every entity. Nothing is synced
//!   locally; the storefront calls it directly.
//! - Every call carries the server-to-server `x-api-key`; calls made on behalf
//!   of a member also carry their bearer token.
//! - Catalog and content reads are cached in memory via `moka`. Writes made
//!   through this client and realtime change events invalidate the cache.
//!
//! # Example
//!
//! ```rust,ignore
//! use ironhouse_storefront::backend::GymApiClient;
//!
//! let client = GymApiClient::new(&config.gym_api)?;
//! let products = client.get_products().await?;
//! let lock = client.lock_stock(&token, &user_id, &products[0].id, 2).await?;
//! ```

mod auth;
mod cache;
mod cart;
mod catalog;
mod client;
mod content;
mod payments;
mod trainers;
pub mod types;

pub use client::GymApiClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the gym backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid backend URL")]
    Url,

    /// Non-success status not covered by a more specific variant.
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Credentials rejected (expired token, wrong password, wrong key).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request conflicts with current state (e.g. stock already locked).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request rejected as invalid (e.g. wrong OTP).
    #[error("Rejected: {0}")]
    Rejected(String),
}

impl BackendError {
    /// Message safe to show a member, if the backend gave one.
    #[must_use]
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Conflict(msg)
            | Self::Rejected(msg) => Some(msg.as_str()),
            _ => None,
        }
    }
}
