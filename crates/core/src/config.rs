//! Application configuration.
//!
//! All tunables live here and are loaded once at startup (see
//! [`crate::config_loader::ConfigLoader`]), then passed by reference into
//! each component. There is no ambient global configuration.
//!
//! Secrets are never stored in the config itself: the config carries the
//! *names* of the environment variables that hold them.

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Exchange client settings.
    pub kalshi: KalshiConfig,

    /// Decision oracle (LLM) settings.
    pub oracle: OracleConfig,

    /// Ledger store settings.
    pub ledger: LedgerConfig,

    /// Trading policy knobs.
    pub trading: TradingConfig,
}

/// Exchange REST client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KalshiConfig {
    /// Base URL for the trade API.
    pub base_url: String,

    /// Environment variable holding the API key ID.
    pub api_key_env: String,

    /// Environment variable holding the RSA private key (PEM).
    pub private_key_env: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Outbound requests per minute.
    pub requests_per_minute: u32,

    /// Markets per page when paginating the list endpoint.
    pub page_limit: u32,
}

impl Default for KalshiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elections.kalshi.com/trade-api/v2".to_string(),
            api_key_env: "KALSHI_API_KEY".to_string(),
            private_key_env: "KALSHI_PRIVATE_KEY".to_string(),
            timeout_secs: 30,
            requests_per_minute: 60,
            page_limit: 1000,
        }
    }
}

/// Decision oracle settings (OpenAI-compatible chat completions endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Base URL of the completions API.
    pub base_url: String,

    /// Model identifier.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Request timeout in seconds. The oracle is the slowest external
    /// call in the system and gets the most generous bound.
    pub timeout_secs: u64,

    /// Oracle requests per minute.
    pub rate_limit_rpm: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "ORACLE_API_KEY".to_string(),
            timeout_secs: 180,
            rate_limit_rpm: 10,
        }
    }
}

/// Ledger store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum pool connections.
    pub max_connections: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/edgebet".to_string(),
            max_connections: 5,
        }
    }
}

/// Trading policy.
///
/// These are policy, not protocol: the execution engine's state machine and
/// the ledger invariant hold for any values here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    /// When true, no real order is ever submitted. Ledger bookkeeping is
    /// unchanged; a simulated run still writes durable SIMULATED entries.
    pub dry_run: bool,

    /// Lower bound of the close-time window, hours from now (exclusive).
    pub min_hours_to_close: i64,

    /// Upper bound of the close-time window, days from now (exclusive).
    pub max_days_to_close: i64,

    /// A market is a long shot when yes_ask <= threshold or
    /// yes_ask >= 100 - threshold, in cents.
    pub longshot_threshold_cents: u32,

    /// Minimum oracle confidence to act on a decision.
    pub min_confidence: f64,

    /// Minimum confidence to act on a long-shot candidate.
    pub longshot_min_confidence: f64,

    /// Default stake per bet, in cents.
    pub stake_cents: i64,

    /// Cap applied to oracle stake hints, in cents.
    pub max_stake_cents: i64,

    /// Maximum candidates forwarded to the oracle per run.
    pub max_oracle_candidates: usize,

    /// Minimum account balance required before real execution, in cents.
    pub min_balance_cents: i64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            min_hours_to_close: 24,
            max_days_to_close: 7,
            longshot_threshold_cents: 5,
            min_confidence: 0.55,
            longshot_min_confidence: 0.8,
            stake_cents: 500,
            max_stake_cents: 2000,
            max_oracle_candidates: 15,
            min_balance_cents: 500,
        }
    }
}
