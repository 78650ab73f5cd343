//! Error types for the Kalshi exchange integration.
//!
//! Provides typed errors for authentication, API communication, validation,
//! and feed availability. The transient/fatal split drives the feed
//! client's retry policy: transient errors are retried with backoff, 4xx
//! responses are treated as misconfiguration and never retried.

use thiserror::Error;

/// Errors that can occur when interacting with Kalshi.
#[derive(Debug, Error)]
pub enum KalshiError {
    /// RSA signing error.
    #[error("RSA signing error: {0}")]
    Signing(String),

    /// API request failed.
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Error message from API.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimit {
        /// Seconds to wait before retry.
        retry_after_secs: u64,
    },

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Request timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Market listing failed after exhausting retries. Callers must not
    /// trade on the partial set yielded before the failure.
    #[error("market feed unavailable after {attempts} attempts: {message}")]
    FeedUnavailable {
        /// Attempts made on the failing page.
        attempts: u32,
        /// Last underlying error.
        message: String,
    },

    /// Invalid order parameters.
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    /// Insufficient balance.
    #[error(
        "insufficient balance: required {required_cents} cents, available {available_cents} cents"
    )]
    InsufficientBalance {
        /// Required amount in cents.
        required_cents: i64,
        /// Available amount in cents.
        available_cents: i64,
    },

    /// Order rejected by exchange.
    #[error("order rejected: {0}")]
    OrderRejected(String),

    /// Market not found.
    #[error("market not found: {ticker}")]
    MarketNotFound {
        /// The market ticker that was not found.
        ticker: String,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl KalshiError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a rate limit error.
    pub fn rate_limit(retry_after_secs: u64) -> Self {
        Self::RateLimit { retry_after_secs }
    }

    /// Creates a feed unavailable error.
    pub fn feed_unavailable(attempts: u32, message: impl Into<String>) -> Self {
        Self::FeedUnavailable {
            attempts,
            message: message.into(),
        }
    }

    /// Creates an insufficient balance error.
    pub fn insufficient_balance(required_cents: i64, available_cents: i64) -> Self {
        Self::InsufficientBalance {
            required_cents,
            available_cents,
        }
    }

    /// Creates a market not found error.
    pub fn market_not_found(ticker: impl Into<String>) -> Self {
        Self::MarketNotFound {
            ticker: ticker.into(),
        }
    }

    /// Returns true if the request may be retried later.
    ///
    /// 5xx responses, timeouts, connection failures, and rate limits are
    /// transient. 4xx responses signal misconfiguration (bad signature,
    /// bad key) and are never retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimit { .. } => true,
            Self::Api { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for KalshiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for KalshiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for Kalshi operations.
pub type Result<T> = std::result::Result<T, KalshiError>;

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Error Construction Tests ====================

    #[test]
    fn test_api_error_construction() {
        let err = KalshiError::api(400, "bad request");
        assert!(matches!(
            err,
            KalshiError::Api {
                status_code: 400,
                ..
            }
        ));
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("bad request"));
    }

    #[test]
    fn test_feed_unavailable_construction() {
        let err = KalshiError::feed_unavailable(3, "503 service unavailable");
        assert!(err.to_string().contains("3 attempts"));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_insufficient_balance_error() {
        let err = KalshiError::insufficient_balance(5000, 2500);
        assert!(err.to_string().contains("5000"));
        assert!(err.to_string().contains("2500"));
    }

    #[test]
    fn test_market_not_found_error() {
        let err = KalshiError::market_not_found("KXRT-26FEB02");
        assert!(err.to_string().contains("KXRT-26FEB02"));
    }

    // ==================== Transience Tests ====================

    #[test]
    fn test_network_error_is_transient() {
        assert!(KalshiError::Network("connection refused".to_string()).is_transient());
    }

    #[test]
    fn test_timeout_error_is_transient() {
        assert!(KalshiError::Timeout("request timed out".to_string()).is_transient());
    }

    #[test]
    fn test_rate_limit_error_is_transient() {
        assert!(KalshiError::rate_limit(30).is_transient());
    }

    #[test]
    fn test_server_error_is_transient() {
        assert!(KalshiError::api(500, "internal server error").is_transient());
        assert!(KalshiError::api(503, "unavailable").is_transient());
    }

    #[test]
    fn test_client_error_is_not_transient() {
        // Auth/signature failures must never be retried.
        assert!(!KalshiError::api(400, "bad request").is_transient());
        assert!(!KalshiError::api(401, "invalid signature").is_transient());
        assert!(!KalshiError::api(403, "forbidden").is_transient());
    }

    #[test]
    fn test_signing_error_is_not_transient() {
        assert!(!KalshiError::Signing("invalid key".to_string()).is_transient());
    }

    #[test]
    fn test_feed_unavailable_is_not_transient() {
        // Already the product of exhausted retries.
        assert!(!KalshiError::feed_unavailable(3, "gone").is_transient());
    }
}
