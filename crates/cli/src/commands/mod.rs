pub mod markets;
pub mod run;
pub mod settle;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use edgebet_core::{AppConfig, TradingConfig};
use edgebet_kalshi::{KalshiAuth, KalshiAuthConfig, KalshiClient, KalshiClientConfig};
use std::num::NonZeroU32;

/// Builds an authenticated exchange client from config.
///
/// Fails fast on missing or invalid key material — nothing authenticated
/// may run after a configuration error.
pub(crate) fn build_client(config: &AppConfig) -> Result<KalshiClient> {
    let auth = KalshiAuth::from_env(
        KalshiAuthConfig::default()
            .with_env_vars(&config.kalshi.api_key_env, &config.kalshi.private_key_env),
    )?;

    let rpm = NonZeroU32::new(config.kalshi.requests_per_minute)
        .unwrap_or(NonZeroU32::new(60).expect("60 is non-zero"));

    let client_config = KalshiClientConfig::default()
        .with_base_url(&config.kalshi.base_url)
        .with_timeout_secs(config.kalshi.timeout_secs)
        .with_rate_limit(rpm)
        .with_page_limit(config.kalshi.page_limit);

    Ok(KalshiClient::new(client_config, auth)?)
}

/// Returns the close-time analysis window for this run.
pub(crate) fn analysis_window(
    trading: &TradingConfig,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        now + Duration::hours(trading.min_hours_to_close),
        now + Duration::days(trading.max_days_to_close),
    )
}
