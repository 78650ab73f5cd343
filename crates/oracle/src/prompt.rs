//! Prompt construction for the decision oracle.
//!
//! Each candidate is rendered as one compact line so a batch of markets
//! fits in a bounded prompt. The template asks for a single best
//! risk-adjusted trade (or an explicit PASS) in strict JSON.

use crate::types::OpenPosition;
use chrono::NaiveDate;
use edgebet_strategy::Candidate;

/// Rules text is truncated to keep per-market lines bounded.
const MAX_RULES_CHARS: usize = 300;

const PROMPT_TEMPLATE: &str = r#"# Prediction Market Analysis Request for [DATE]

## Role & Objective
You are a superforecaster managing a small prediction-market book. Identify
the SINGLE best risk-adjusted trade from the markets below, or PASS if none
has positive expected value. You care about EV and mispricing relative to
base rates, not excitement or narrative.

## Analysis Framework
1. Base rate anchoring: what is the historical frequency of this event?
2. True probability estimation: base rates adjusted for specifics.
3. EV: compare your true probability against the market implied probability
   (the price). Profit if win is roughly $1.00 - price; cost is the price.

## Constraints & Rules
1. Spread: avoid markets whose spread marker exceeds 5c unless the edge is large.
2. Liquidity: avoid markets with Liq below 100 unless you are near-certain.
3. Long shots: lines marked LONGSHOT are priced near an extreme; the market
   is usually right there. Be extremely skeptical.
4. You may buy YES or NO.

## Current Portfolio
[PORTFOLIO_DATA]

## Market Data
(Format: Ticker | Title (Subtitle) | Close | Y:ask N:ask | Spread | Last | Vol Liq | Rules)
[MARKET DATA GOES HERE]

## Required Output Format (JSON ONLY, no markdown fences)
{
  "decision": "BET" or "PASS",
  "ticker": "MARKET-TICKER",
  "side": "yes" or "no",
  "probability": 0.65,
  "confidence": 0.8,
  "stake": 5.00,
  "reasoning": "Base rate is X. Specifics are Y. The market misprices because Z."
}
"#;

/// Formats a dollar price from integer cents.
fn dollars(cents: u32) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

/// Formats one candidate as a single prompt line.
#[must_use]
pub fn format_candidate(candidate: &Candidate) -> String {
    let market = &candidate.market;

    let subtitle = match market.subtitle.as_deref() {
        Some(s) if !s.is_empty() => format!(" ({s})"),
        _ => String::new(),
    };

    let close = market
        .close_time
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_default();

    let prices = match (market.yes_ask, market.no_ask) {
        (Some(yes), Some(no)) => format!("Y:{} N:{}", dollars(yes), dollars(no)),
        _ => "Y:- N:-".to_string(),
    };

    let longshot = if candidate.long_shot { " | LONGSHOT" } else { "" };

    let last = market
        .last_price
        .map(|p| format!(" | Last:{}", dollars(p)))
        .unwrap_or_default();

    let rules = match market.rules.as_deref() {
        Some(r) if !r.is_empty() => {
            let truncated = if r.chars().count() > MAX_RULES_CHARS {
                let cut: String = r.chars().take(MAX_RULES_CHARS - 3).collect();
                format!("{cut}...")
            } else {
                r.to_string()
            };
            format!(" | Rules: {truncated}")
        }
        _ => String::new(),
    };

    format!(
        "{} | {}{} | Close:{} | {} | Spread:{}c{}{} | Vol:{} Liq:{}{}",
        market.ticker,
        market.title,
        subtitle,
        close,
        prices,
        candidate.spread_cents,
        longshot,
        last,
        market.volume,
        market.liquidity,
        rules
    )
}

/// Formats the open-position section of the prompt.
fn format_portfolio(portfolio: &[OpenPosition]) -> String {
    if portfolio.is_empty() {
        return "No active positions.".to_string();
    }

    portfolio
        .iter()
        .map(|p| {
            let title = p.title.as_deref().unwrap_or("");
            format!("- {} on {} ({})", p.side.to_uppercase(), p.ticker, title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the full oracle prompt for a candidate batch.
#[must_use]
pub fn build_prompt(candidates: &[Candidate], portfolio: &[OpenPosition], today: NaiveDate) -> String {
    let markets_text = candidates
        .iter()
        .map(format_candidate)
        .collect::<Vec<_>>()
        .join("\n");

    PROMPT_TEMPLATE
        .replace("[DATE]", &today.format("%Y-%m-%d").to_string())
        .replace("[PORTFOLIO_DATA]", &format_portfolio(portfolio))
        .replace("[MARKET DATA GOES HERE]", &markets_text)
}
