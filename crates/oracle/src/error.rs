//! Error types for the decision oracle boundary.
//!
//! An oracle failure is never fatal to a run: the affected candidate batch
//! yields no decisions and the pipeline continues.

use thiserror::Error;

/// Errors from the decision oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Missing or invalid oracle configuration (API key, endpoint).
    #[error("oracle configuration error: {0}")]
    Configuration(String),

    /// Transport-level failure talking to the oracle.
    #[error("oracle transport error: {0}")]
    Transport(String),

    /// The oracle did not answer within the configured bound.
    #[error("oracle timed out after {timeout_secs}s")]
    Timeout {
        /// The configured timeout in seconds.
        timeout_secs: u64,
    },

    /// The oracle replied, but not in a shape we can act on.
    #[error("invalid oracle response: {0}")]
    InvalidResponse(String),
}

impl OracleError {
    /// Creates a timeout error.
    pub fn timeout(timeout_secs: u64) -> Self {
        Self::Timeout { timeout_secs }
    }
}

impl From<async_openai::error::OpenAIError> for OracleError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Result type alias for oracle operations.
pub type Result<T> = std::result::Result<T, OracleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = OracleError::timeout(180);
        assert!(err.to_string().contains("180"));
    }

    #[test]
    fn test_configuration_display() {
        let err = OracleError::Configuration("missing environment variable: ORACLE_API_KEY".into());
        assert!(err.to_string().contains("ORACLE_API_KEY"));
    }
}
