//! Data models for the Kalshi exchange integration.
//!
//! Kalshi prices are integer cents (1-99 while a market is active); all
//! money amounts here are integer cents as well. A `Market` is an
//! immutable snapshot of one fetch — it is never cached across runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Market Types
// =============================================================================

/// A Kalshi market (event contract) snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// Market ticker (e.g., "KXRT-26FEB02-B85"). Unique exchange identifier.
    pub ticker: String,

    /// Market title/question.
    pub title: String,

    /// Market subtitle (often describes the condition).
    pub subtitle: Option<String>,

    /// Whether the market is currently open for trading.
    pub status: MarketStatus,

    /// Yes ask price in cents (1-99 when active).
    pub yes_ask: Option<u32>,

    /// No ask price in cents (1-99 when active).
    pub no_ask: Option<u32>,

    /// Last trade price in cents.
    pub last_price: Option<u32>,

    /// Total traded volume in contracts.
    pub volume: i64,

    /// Liquidity measure (resting order value / open interest).
    pub liquidity: i64,

    /// Market close time.
    pub close_time: Option<DateTime<Utc>>,

    /// Primary settlement rules text.
    pub rules: Option<String>,

    /// Settlement result once the market is terminal ("yes", "no", "void", ...).
    pub result: Option<String>,
}

impl Market {
    /// Returns true if the market is currently tradeable.
    #[must_use]
    pub fn is_tradeable(&self) -> bool {
        self.status == MarketStatus::Open
    }

    /// Returns true if both sides have a quoted ask.
    #[must_use]
    pub fn has_quotes(&self) -> bool {
        self.yes_ask.is_some() && self.no_ask.is_some()
    }

    /// Returns the ask price in cents for the given side.
    #[must_use]
    pub fn ask_for(&self, side: Side) -> Option<u32> {
        match side {
            Side::Yes => self.yes_ask,
            Side::No => self.no_ask,
        }
    }

    /// Returns the parsed settlement result, if the market has one.
    #[must_use]
    pub fn settlement(&self) -> Option<MarketResult> {
        self.result.as_deref().and_then(MarketResult::parse)
    }
}

/// Market status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketStatus {
    /// Market is open for trading.
    Open,
    /// Market is closed (no trading).
    Closed,
    /// Market has settled.
    Settled,
    /// Market result is finalized.
    Finalized,
    /// Market is paused.
    Paused,
}

impl MarketStatus {
    /// Returns true once trading has permanently ended and a result may exist.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Settled | Self::Finalized)
    }
}

/// Parsed settlement result of a terminal market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketResult {
    /// Settled YES.
    Yes,
    /// Settled NO.
    No,
    /// Voided / canceled / refunded.
    Void,
}

impl MarketResult {
    /// Parses an exchange result string. Unknown values map to `None` and
    /// should be left for a later sweep.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            "void" | "canceled" | "cancelled" | "refunded" => Some(Self::Void),
            _ => None,
        }
    }
}

// =============================================================================
// Order Types
// =============================================================================

/// Side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// YES contracts.
    Yes,
    /// NO contracts.
    No,
}

impl Side {
    /// Returns the opposite side.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
        }
    }

    /// Returns the API string representation.
    #[must_use]
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }

    /// Parses a side string, case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            _ => None,
        }
    }
}

/// Order action (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Buy contracts.
    Buy,
    /// Sell contracts.
    Sell,
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Market order (fill at best available).
    Market,
    /// Limit order (fill at specified price or better).
    Limit,
}

/// Request to submit an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Market ticker.
    pub ticker: String,

    /// Side (yes/no).
    pub side: Side,

    /// Action (buy/sell).
    pub action: Action,

    /// Order type.
    #[serde(rename = "type")]
    pub order_type: OrderType,

    /// Number of contracts.
    pub count: u32,

    /// Limit price in cents for YES orders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yes_price: Option<u32>,

    /// Limit price in cents for NO orders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_price: Option<u32>,

    /// Client-specified order ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
}

impl OrderRequest {
    /// Creates a limit buy order for the given side.
    pub fn buy(ticker: impl Into<String>, side: Side, price_cents: u32, count: u32) -> Self {
        let (yes_price, no_price) = match side {
            Side::Yes => (Some(price_cents), None),
            Side::No => (None, Some(price_cents)),
        };
        Self {
            ticker: ticker.into(),
            side,
            action: Action::Buy,
            order_type: OrderType::Limit,
            count,
            yes_price,
            no_price,
            client_order_id: None,
        }
    }

    /// Creates a limit buy order for YES contracts.
    pub fn buy_yes(ticker: impl Into<String>, price_cents: u32, count: u32) -> Self {
        Self::buy(ticker, Side::Yes, price_cents, count)
    }

    /// Creates a limit buy order for NO contracts.
    pub fn buy_no(ticker: impl Into<String>, price_cents: u32, count: u32) -> Self {
        Self::buy(ticker, Side::No, price_cents, count)
    }

    /// Sets a client order ID.
    #[must_use]
    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }

    /// Returns the order value in cents.
    #[must_use]
    pub fn order_value_cents(&self) -> i64 {
        let price = self.yes_price.or(self.no_price).unwrap_or(0) as i64;
        price * self.count as i64
    }
}

/// Status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order is pending (not yet on book).
    Pending,
    /// Order is resting on the book.
    Resting,
    /// Order was fully filled.
    Filled,
    /// Order was canceled.
    Canceled,
    /// Order was rejected.
    Rejected,
}

/// Response from order submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Order ID assigned by the exchange.
    pub order_id: String,

    /// Client order ID if provided.
    pub client_order_id: Option<String>,

    /// Market ticker.
    pub ticker: String,

    /// Side (yes/no).
    pub side: Side,

    /// Order status.
    pub status: OrderStatus,

    /// Order quantity in contracts.
    pub count: u32,

    /// Limit price in cents.
    pub price: Option<u32>,

    /// Taker fees charged, in cents.
    pub taker_fee_cents: Option<i64>,

    /// Order creation time.
    pub created_time: Option<DateTime<Utc>>,
}

// =============================================================================
// Balance Types
// =============================================================================

/// Account balance information, in cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    /// Cash balance in cents.
    pub balance: i64,

    /// Current value of open positions in cents.
    pub portfolio_value: i64,
}

impl Balance {
    /// Returns cash plus position value in cents.
    #[must_use]
    pub fn total_equity_cents(&self) -> i64 {
        self.balance + self.portfolio_value
    }
}
