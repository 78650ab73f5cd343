//! Liquidity and close-time window filtering.
//!
//! Pure functions over market snapshots: no I/O, no clock reads — `now` is
//! always passed in, which keeps fixtures reproducible. A market is
//! retained iff its close time falls strictly inside the configured window
//! (default now+24h to now+7d, both bounds exclusive: imminent closes are
//! too volatile, far closes too slow to act on) and it shows any life
//! (volume > 0 or liquidity > 0) and both sides are quoted.

use chrono::{DateTime, Duration, Utc};
use edgebet_core::TradingConfig;
use edgebet_kalshi::types::Market;

/// A market that survived filtering, with derived trading context.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The underlying market snapshot.
    pub market: Market,

    /// Time until the market closes.
    pub time_to_close: Duration,

    /// House edge in cents: |100 - (yes_ask + no_ask)|.
    pub spread_cents: u32,

    /// True when the yes price sits near 0 or 100. The market is usually
    /// right at the extremes, so long shots get a higher confidence bar.
    pub long_shot: bool,
}

impl Candidate {
    /// Derives candidate fields from a market snapshot.
    ///
    /// Returns `None` when the market has no close time or is missing a
    /// quote on either side — such a market cannot be priced or traded.
    #[must_use]
    pub fn derive(market: Market, now: DateTime<Utc>, longshot_threshold_cents: u32) -> Option<Self> {
        let close_time = market.close_time?;
        let yes_ask = market.yes_ask?;
        let no_ask = market.no_ask?;

        let sum = yes_ask as i64 + no_ask as i64;
        let spread_cents = (sum - 100).unsigned_abs() as u32;

        let long_shot = yes_ask <= longshot_threshold_cents
            || yes_ask >= 100 - longshot_threshold_cents.min(100);

        Some(Self {
            time_to_close: close_time - now,
            spread_cents,
            long_shot,
            market,
        })
    }

    /// The market ticker.
    #[must_use]
    pub fn ticker(&self) -> &str {
        &self.market.ticker
    }
}

/// Filters markets to tradeable candidates inside the close-time window.
///
/// Retained iff:
/// - the close time is strictly between `now + min_hours_to_close` and
///   `now + max_days_to_close` (boundary closes are excluded), and
/// - volume > 0 or liquidity > 0, and
/// - the market is open with both asks quoted.
///
/// The result is ordered by close time ascending, ticker as tie-break, so
/// identical inputs always produce identical output.
#[must_use]
pub fn filter_candidates(
    markets: Vec<Market>,
    now: DateTime<Utc>,
    config: &TradingConfig,
) -> Vec<Candidate> {
    let window_start = now + Duration::hours(config.min_hours_to_close);
    let window_end = now + Duration::days(config.max_days_to_close);

    let mut candidates: Vec<Candidate> = markets
        .into_iter()
        .filter(|m| m.is_tradeable())
        .filter(|m| m.volume > 0 || m.liquidity > 0)
        .filter(|m| match m.close_time {
            Some(close) => close > window_start && close < window_end,
            None => false,
        })
        .filter_map(|m| Candidate::derive(m, now, config.longshot_threshold_cents))
        .collect();

    candidates.sort_by(|a, b| {
        a.market
            .close_time
            .cmp(&b.market.close_time)
            .then_with(|| a.market.ticker.cmp(&b.market.ticker))
    });

    candidates
}

/// Caps the candidate batch forwarded to the oracle.
///
/// Highest-volume markets first: they carry the most information and the
/// prompt has a bounded size.
#[must_use]
pub fn select_for_oracle(mut candidates: Vec<Candidate>, max: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.market
            .volume
            .cmp(&a.market.volume)
            .then_with(|| b.market.liquidity.cmp(&a.market.liquidity))
            .then_with(|| a.market.ticker.cmp(&b.market.ticker))
    });
    candidates.truncate(max);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use edgebet_kalshi::types::MarketStatus;

    fn test_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap()
    }

    fn make_market(ticker: &str, close: DateTime<Utc>, volume: i64, liquidity: i64) -> Market {
        Market {
            ticker: ticker.to_string(),
            title: format!("Market {ticker}"),
            subtitle: None,
            status: MarketStatus::Open,
            yes_ask: Some(40),
            no_ask: Some(63),
            last_price: Some(41),
            volume,
            liquidity,
            close_time: Some(close),
            rules: None,
            result: None,
        }
    }

    fn config() -> TradingConfig {
        TradingConfig::default()
    }

    // ==================== Window Tests ====================

    #[test]
    fn test_window_boundaries_are_exclusive() {
        let now = test_now();
        let markets = vec![
            // Exactly at now+24h: excluded.
            make_market("AT-LOWER", now + Duration::hours(24), 10, 10),
            // Just inside the lower bound: retained.
            make_market("IN-LOWER", now + Duration::hours(24) + Duration::seconds(1), 10, 10),
            // Comfortably inside: retained.
            make_market("IN-MID", now + Duration::days(3), 10, 10),
            // Just inside the upper bound: retained.
            make_market("IN-UPPER", now + Duration::days(7) - Duration::seconds(1), 10, 10),
            // Exactly at now+7d: excluded.
            make_market("AT-UPPER", now + Duration::days(7), 10, 10),
            // Outside both ways.
            make_market("TOO-SOON", now + Duration::hours(2), 10, 10),
            make_market("TOO-FAR", now + Duration::days(30), 10, 10),
        ];

        let candidates = filter_candidates(markets, now, &config());
        let tickers: Vec<&str> = candidates.iter().map(Candidate::ticker).collect();
        assert_eq!(tickers, ["IN-LOWER", "IN-MID", "IN-UPPER"]);
    }

    #[test]
    fn test_missing_close_time_excluded() {
        let now = test_now();
        let mut market = make_market("NO-CLOSE", now + Duration::days(3), 10, 10);
        market.close_time = None;

        assert!(filter_candidates(vec![market], now, &config()).is_empty());
    }

    // ==================== Liquidity Tests ====================

    #[test]
    fn test_dead_markets_excluded() {
        let now = test_now();
        let close = now + Duration::days(3);
        let markets = vec![
            make_market("DEAD", close, 0, 0),
            make_market("VOL-ONLY", close, 5, 0),
            make_market("LIQ-ONLY", close, 0, 5),
        ];

        let candidates = filter_candidates(markets, now, &config());
        let tickers: Vec<&str> = candidates.iter().map(Candidate::ticker).collect();
        assert_eq!(tickers, ["LIQ-ONLY", "VOL-ONLY"]);
    }

    #[test]
    fn test_unquoted_markets_excluded() {
        let now = test_now();
        let mut market = make_market("UNQUOTED", now + Duration::days(3), 10, 10);
        market.no_ask = None;

        assert!(filter_candidates(vec![market], now, &config()).is_empty());
    }

    #[test]
    fn test_closed_markets_excluded() {
        let now = test_now();
        let mut market = make_market("CLOSED", now + Duration::days(3), 10, 10);
        market.status = MarketStatus::Closed;

        assert!(filter_candidates(vec![market], now, &config()).is_empty());
    }

    // ==================== Ordering Tests ====================

    #[test]
    fn test_output_ordered_by_close_time_then_ticker() {
        let now = test_now();
        let markets = vec![
            make_market("B", now + Duration::days(2), 10, 10),
            make_market("C", now + Duration::days(4), 10, 10),
            make_market("A", now + Duration::days(2), 10, 10),
        ];

        let candidates = filter_candidates(markets, now, &config());
        let tickers: Vec<&str> = candidates.iter().map(Candidate::ticker).collect();
        assert_eq!(tickers, ["A", "B", "C"]);
    }

    // ==================== Derived Field Tests ====================

    #[test]
    fn test_spread_derivation() {
        let now = test_now();
        // 40 + 63 = 103, spread 3.
        let candidates = filter_candidates(
            vec![make_market("SPREAD", now + Duration::days(3), 10, 10)],
            now,
            &config(),
        );
        assert_eq!(candidates[0].spread_cents, 3);
        assert!(!candidates[0].long_shot);
    }

    #[test]
    fn test_spread_is_absolute() {
        let now = test_now();
        let mut market = make_market("TIGHT", now + Duration::days(3), 10, 10);
        market.yes_ask = Some(45);
        market.no_ask = Some(50); // sum 95, spread 5

        let candidates = filter_candidates(vec![market], now, &config());
        assert_eq!(candidates[0].spread_cents, 5);
    }

    #[test]
    fn test_long_shot_flags() {
        let now = test_now();
        let close = now + Duration::days(3);

        let mut low = make_market("LOW", close, 10, 10);
        low.yes_ask = Some(3);
        low.no_ask = Some(98);

        let mut high = make_market("HIGH", close, 10, 10);
        high.yes_ask = Some(97);
        high.no_ask = Some(4);

        let mut at_threshold = make_market("EDGE", close, 10, 10);
        at_threshold.yes_ask = Some(5);
        at_threshold.no_ask = Some(96);

        let candidates = filter_candidates(vec![low, high, at_threshold], now, &config());
        for c in &candidates {
            assert!(c.long_shot, "{} should be a long shot", c.ticker());
        }
    }

    #[test]
    fn test_time_to_close() {
        let now = test_now();
        let candidates = filter_candidates(
            vec![make_market("TTC", now + Duration::days(3), 10, 10)],
            now,
            &config(),
        );
        assert_eq!(candidates[0].time_to_close, Duration::days(3));
    }

    // ==================== Oracle Selection Tests ====================

    #[test]
    fn test_select_for_oracle_caps_by_volume() {
        let now = test_now();
        let close = now + Duration::days(3);
        let candidates = filter_candidates(
            vec![
                make_market("SMALL", close, 10, 10),
                make_market("BIG", close, 9000, 10),
                make_market("MID", close, 500, 10),
            ],
            now,
            &config(),
        );

        let selected = select_for_oracle(candidates, 2);
        let tickers: Vec<&str> = selected.iter().map(Candidate::ticker).collect();
        assert_eq!(tickers, ["BIG", "MID"]);
    }

    #[test]
    fn test_select_for_oracle_under_cap_keeps_all() {
        let now = test_now();
        let close = now + Duration::days(3);
        let candidates = filter_candidates(
            vec![make_market("ONLY", close, 10, 10)],
            now,
            &config(),
        );
        assert_eq!(select_for_oracle(candidates, 15).len(), 1);
    }
}
