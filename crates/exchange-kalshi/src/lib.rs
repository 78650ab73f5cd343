//! Kalshi exchange integration for the edgebet trading pipeline.
//!
//! This crate provides:
//! - RSA-PSS request signing (signature over `timestamp + method + path`;
//!   the body is excluded in Kalshi's scheme)
//! - A rate-limited REST client with lazy, cursor-paginated market listing
//! - Order submission and balance queries
//! - Typed errors with a transient/fatal split driving retry policy
//!
//! # Authentication
//!
//! Set the following environment variables (names are configurable):
//!
//! - `KALSHI_API_KEY`: your API key ID
//! - `KALSHI_PRIVATE_KEY`: your RSA private key in PEM format
//!
//! # Feed semantics
//!
//! [`KalshiClient::market_stream`] fetches pages on demand and signs each
//! request fresh. A transiently failing page is retried with bounded
//! exponential backoff (3 attempts); exhaustion aborts the listing with
//! [`KalshiError::FeedUnavailable`] so callers never mistake a truncated
//! listing for a complete one. 4xx responses are fatal misconfiguration
//! and are never retried.

pub mod auth;
pub mod client;
pub mod error;
pub mod types;

pub use auth::{KalshiAuth, KalshiAuthConfig, SignedHeaders};
pub use client::{KalshiClient, KalshiClientConfig, KALSHI_PROD_URL};
pub use error::{KalshiError, Result};
pub use types::{
    Balance, Market, MarketResult, MarketStatus, Order, OrderRequest, OrderStatus, Side,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_exports() {
        let _ = KalshiAuthConfig::default();
        let _ = KalshiClientConfig::default();
    }

    #[test]
    fn test_constants_accessible() {
        assert!(KALSHI_PROD_URL.starts_with("https://"));
    }
}
