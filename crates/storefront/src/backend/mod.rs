//! Client for the store's REST backend.
//!
//! The backend owns addresses, carts, coupons and orders. This module only
//! speaks its JSON wire format; the checkout sees it through the traits in
//! [`crate::checkout::ports`].

mod client;

pub use client::BackendClient;

use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never produced a response.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured API token cannot be sent as a header value.
    #[error("Invalid API token: {0}")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),

    /// The configured base URL cannot take path segments.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}
