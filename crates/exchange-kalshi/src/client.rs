//! Kalshi REST API client with rate limiting.
//!
//! Provides typed, authenticated access to the Kalshi trade API. Market
//! listing is exposed as a lazy cursor-paginated stream: each page is
//! fetched on demand and signed fresh (every request carries its own
//! timestamp). A page that fails transiently is retried in place with
//! bounded exponential backoff; exhausting the retries aborts the whole
//! listing with [`KalshiError::FeedUnavailable`] rather than yielding a
//! silently truncated set.
//!
//! # Example
//!
//! ```ignore
//! use edgebet_kalshi::{KalshiAuth, KalshiAuthConfig, KalshiClient, KalshiClientConfig};
//! use chrono::{Duration, Utc};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let auth = KalshiAuth::from_env(KalshiAuthConfig::default())?;
//!     let client = KalshiClient::new(KalshiClientConfig::default(), auth)?;
//!
//!     let now = Utc::now();
//!     let markets = client
//!         .list_open_markets(now + Duration::hours(24), now + Duration::days(7))
//!         .await?;
//!     println!("{} markets closing in the window", markets.len());
//!     Ok(())
//! }
//! ```

use crate::auth::KalshiAuth;
use crate::error::{KalshiError, Result};
use crate::types::{Balance, Market, MarketStatus, Order, OrderRequest, OrderStatus, Side};
use async_stream::try_stream;
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Constants
// =============================================================================

/// Kalshi production API base URL.
pub const KALSHI_PROD_URL: &str = "https://api.elections.kalshi.com/trade-api/v2";

/// Total attempts per markets page before the listing aborts.
const PAGE_FETCH_ATTEMPTS: u32 = 3;

/// Base delay for the page retry backoff (doubles per attempt).
const PAGE_RETRY_BASE: Duration = Duration::from_millis(250);

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the Kalshi client.
#[derive(Debug, Clone)]
pub struct KalshiClientConfig {
    /// Base URL for the API.
    pub base_url: String,

    /// Requests per minute limit.
    pub requests_per_minute: NonZeroU32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Markets per page when paginating.
    pub page_limit: u32,
}

impl Default for KalshiClientConfig {
    fn default() -> Self {
        Self {
            base_url: KALSHI_PROD_URL.to_string(),
            requests_per_minute: nonzero!(60u32),
            timeout_secs: 30,
            page_limit: 1000,
        }
    }
}

impl KalshiClientConfig {
    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the rate limit.
    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_minute: NonZeroU32) -> Self {
        self.requests_per_minute = requests_per_minute;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Sets the page size for market listing.
    #[must_use]
    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit;
        self
    }
}

// =============================================================================
// API Response Types
// =============================================================================

/// One page of the paginated markets listing.
#[derive(Debug, Clone)]
struct MarketsPage {
    markets: Vec<Market>,
    cursor: Option<String>,
}

/// Raw markets response from the Kalshi API.
#[derive(Debug, Clone, Deserialize)]
struct RawMarketsResponse {
    markets: Option<Vec<RawMarket>>,
    cursor: Option<String>,
}

impl From<RawMarketsResponse> for MarketsPage {
    fn from(raw: RawMarketsResponse) -> Self {
        Self {
            markets: raw
                .markets
                .unwrap_or_default()
                .into_iter()
                .map(Market::from)
                .collect(),
            cursor: raw.cursor.filter(|c| !c.is_empty()),
        }
    }
}

/// Raw market data from the API.
#[derive(Debug, Clone, Deserialize)]
struct RawMarket {
    ticker: String,
    title: Option<String>,
    subtitle: Option<String>,
    yes_sub_title: Option<String>,
    status: Option<String>,
    yes_ask: Option<i64>,
    no_ask: Option<i64>,
    last_price: Option<i64>,
    volume: Option<i64>,
    open_interest: Option<i64>,
    liquidity: Option<i64>,
    close_time: Option<String>,
    rules_primary: Option<String>,
    result: Option<String>,
}

/// Converts a raw cent price: zero means "no quote" on this exchange.
fn price_cents(raw: Option<i64>) -> Option<u32> {
    raw.and_then(|p| u32::try_from(p).ok()).filter(|p| *p > 0)
}

impl From<RawMarket> for Market {
    fn from(raw: RawMarket) -> Self {
        let status = match raw.status.as_deref() {
            Some("open") | Some("active") => MarketStatus::Open,
            Some("settled") => MarketStatus::Settled,
            Some("finalized") => MarketStatus::Finalized,
            Some("paused") => MarketStatus::Paused,
            _ => MarketStatus::Closed,
        };

        Self {
            ticker: raw.ticker,
            title: raw.title.unwrap_or_default(),
            subtitle: raw.subtitle.or(raw.yes_sub_title),
            status,
            yes_ask: price_cents(raw.yes_ask),
            no_ask: price_cents(raw.no_ask),
            last_price: price_cents(raw.last_price),
            volume: raw.volume.unwrap_or(0),
            liquidity: raw.liquidity.or(raw.open_interest).unwrap_or(0),
            close_time: raw.close_time.and_then(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .ok()
                    .map(|d| d.with_timezone(&Utc))
            }),
            rules: raw.rules_primary,
            result: raw.result.filter(|r| !r.is_empty()),
        }
    }
}

/// Raw order response from the Kalshi API.
#[derive(Debug, Clone, Deserialize)]
struct RawOrderResponse {
    order: Option<RawOrder>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawOrder {
    order_id: String,
    client_order_id: Option<String>,
    ticker: String,
    side: Option<String>,
    status: Option<String>,
    count: Option<i64>,
    yes_price: Option<i64>,
    no_price: Option<i64>,
    taker_fees: Option<i64>,
    created_time: Option<String>,
}

impl From<RawOrder> for Order {
    fn from(raw: RawOrder) -> Self {
        let side = raw
            .side
            .as_deref()
            .and_then(Side::parse)
            .unwrap_or(Side::Yes);

        let status = match raw.status.as_deref() {
            Some("resting") => OrderStatus::Resting,
            Some("executed") | Some("filled") => OrderStatus::Filled,
            Some("canceled") | Some("cancelled") => OrderStatus::Canceled,
            Some("rejected") => OrderStatus::Rejected,
            _ => OrderStatus::Pending,
        };

        Self {
            order_id: raw.order_id,
            client_order_id: raw.client_order_id,
            ticker: raw.ticker,
            side,
            status,
            count: raw.count.unwrap_or(0).max(0) as u32,
            price: price_cents(match side {
                Side::Yes => raw.yes_price,
                Side::No => raw.no_price,
            }),
            taker_fee_cents: raw.taker_fees,
            created_time: raw.created_time.and_then(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .ok()
                    .map(|d| d.with_timezone(&Utc))
            }),
        }
    }
}

/// Raw balance response from the Kalshi API.
#[derive(Debug, Clone, Deserialize)]
struct RawBalanceResponse {
    balance: Option<i64>,
    portfolio_value: Option<i64>,
}

// =============================================================================
// KalshiClient
// =============================================================================

/// Kalshi REST API client.
///
/// All requests are rate-limited and signed fresh at send time.
pub struct KalshiClient {
    /// Configuration.
    config: KalshiClientConfig,

    /// HTTP client.
    http: Client,

    /// Rate limiter.
    rate_limiter: Arc<
        RateLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,

    /// Authentication handler.
    auth: KalshiAuth,
}

impl std::fmt::Debug for KalshiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KalshiClient")
            .field("base_url", &self.config.base_url)
            .field("requests_per_minute", &self.config.requests_per_minute)
            .finish_non_exhaustive()
    }
}

impl KalshiClient {
    /// Creates a new client with the given configuration and authenticator.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: KalshiClientConfig, auth: KalshiAuth) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| KalshiError::Network(format!("failed to build HTTP client: {e}")))?;

        let quota = Quota::per_minute(config.requests_per_minute);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            config,
            http,
            rate_limiter,
            auth,
        })
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Validates a ticker string to prevent path traversal.
    ///
    /// Valid tickers contain only alphanumeric characters, hyphens, and
    /// underscores, e.g. "KXRT-26FEB02-B85".
    fn validate_ticker(ticker: &str) -> Result<&str> {
        if ticker.is_empty() {
            return Err(KalshiError::InvalidOrder("ticker cannot be empty".to_string()));
        }

        if !ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(KalshiError::InvalidOrder(format!(
                "invalid ticker: must contain only alphanumeric, hyphen, or underscore: {ticker}"
            )));
        }

        if ticker.len() > 64 {
            return Err(KalshiError::InvalidOrder(format!(
                "invalid ticker: exceeds maximum length of 64: {}",
                ticker.len()
            )));
        }

        Ok(ticker)
    }

    /// Waits for the rate limiter and makes an authenticated GET request.
    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.config.base_url, path);
        let headers = self.auth.sign_request("GET", path)?;

        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .header(headers.as_tuples()[0].0, headers.as_tuples()[0].1)
            .header(headers.as_tuples()[1].0, headers.as_tuples()[1].1)
            .header(headers.as_tuples()[2].0, headers.as_tuples()[2].1)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Waits for the rate limiter and makes an authenticated POST request.
    async fn post<T: serde::de::DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.config.base_url, path);
        let body_json = serde_json::to_string(body)?;
        let headers = self.auth.sign_request("POST", path)?;

        tracing::debug!("POST {} body_len={}", url, body_json.len());

        let response = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .header(headers.as_tuples()[0].0, headers.as_tuples()[0].1)
            .header(headers.as_tuples()[1].0, headers.as_tuples()[1].1)
            .header(headers.as_tuples()[2].0, headers.as_tuples()[2].1)
            .body(body_json)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handles an API response, converting errors appropriately.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(KalshiError::rate_limit(retry_after));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(KalshiError::api(status.as_u16(), text));
        }

        let body = response.json::<T>().await?;
        Ok(body)
    }

    // =========================================================================
    // Market Endpoints
    // =========================================================================

    /// Returns a lazy stream of markets closing inside the given window.
    ///
    /// Pages are fetched on demand; markets already yielded are not
    /// discarded by a later page failure, but the stream then terminates
    /// with [`KalshiError::FeedUnavailable`] (or the underlying 4xx error)
    /// and the caller must not treat the partial set as complete.
    pub fn market_stream(
        &self,
        closing_after: DateTime<Utc>,
        closing_before: DateTime<Utc>,
    ) -> impl Stream<Item = Result<Market>> + '_ {
        try_stream! {
            let mut cursor: Option<String> = None;
            loop {
                let page = self
                    .fetch_markets_page(closing_after, closing_before, cursor.as_deref())
                    .await?;

                if page.markets.is_empty() {
                    break;
                }
                for market in page.markets {
                    yield market;
                }

                cursor = match page.cursor {
                    Some(c) => Some(c),
                    None => break,
                };
            }
        }
    }

    /// Collects the full market listing for the window.
    ///
    /// # Errors
    /// Returns [`KalshiError::FeedUnavailable`] if any page failed after
    /// retries; callers must never trade on an incomplete feed.
    pub async fn list_open_markets(
        &self,
        closing_after: DateTime<Utc>,
        closing_before: DateTime<Utc>,
    ) -> Result<Vec<Market>> {
        let stream = self.market_stream(closing_after, closing_before);
        futures::pin_mut!(stream);

        let mut markets = Vec::new();
        while let Some(market) = stream.next().await {
            markets.push(market?);
        }
        Ok(markets)
    }

    /// Fetches one page, retrying transient failures with exponential
    /// backoff. 4xx errors are returned immediately — retrying a bad
    /// signature cannot help.
    async fn fetch_markets_page(
        &self,
        closing_after: DateTime<Utc>,
        closing_before: DateTime<Utc>,
        cursor: Option<&str>,
    ) -> Result<MarketsPage> {
        let mut path = format!(
            "/markets?limit={}&min_close_ts={}&max_close_ts={}",
            self.config.page_limit,
            closing_after.timestamp(),
            closing_before.timestamp()
        );
        if let Some(c) = cursor {
            path.push_str("&cursor=");
            path.push_str(c);
        }

        let mut attempt: u32 = 1;
        loop {
            match self.get::<RawMarketsResponse>(&path).await {
                Ok(raw) => return Ok(raw.into()),
                Err(e) if e.is_transient() && attempt < PAGE_FETCH_ATTEMPTS => {
                    let delay = PAGE_RETRY_BASE * 2u32.pow(attempt - 1);
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "markets page fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_transient() => {
                    return Err(KalshiError::feed_unavailable(
                        PAGE_FETCH_ATTEMPTS,
                        e.to_string(),
                    ));
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Gets a specific market by ticker.
    ///
    /// # Errors
    /// Returns error if the market is not found or the API call fails.
    pub async fn get_market(&self, ticker: &str) -> Result<Market> {
        let ticker = Self::validate_ticker(ticker)?;
        let path = format!("/markets/{ticker}");

        #[derive(Deserialize)]
        struct SingleMarketResponse {
            market: Option<RawMarket>,
        }

        let response: SingleMarketResponse = self.get(&path).await?;

        response
            .market
            .map(Market::from)
            .ok_or_else(|| KalshiError::market_not_found(ticker))
    }

    // =========================================================================
    // Portfolio Endpoints
    // =========================================================================

    /// Gets the account balance, in cents.
    ///
    /// # Errors
    /// Returns error if the API call fails.
    pub async fn get_balance(&self) -> Result<Balance> {
        let response: RawBalanceResponse = self.get("/portfolio/balance").await?;

        Ok(Balance {
            balance: response.balance.unwrap_or(0),
            portfolio_value: response.portfolio_value.unwrap_or(0),
        })
    }

    /// Submits an order.
    ///
    /// # Errors
    /// Returns error if the order is rejected or the API call fails.
    pub async fn submit_order(&self, order: &OrderRequest) -> Result<Order> {
        Self::validate_ticker(&order.ticker)?;

        let response: RawOrderResponse = self.post("/portfolio/orders", order).await?;

        response
            .order
            .map(Order::from)
            .ok_or_else(|| KalshiError::OrderRejected("no order in response".to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
