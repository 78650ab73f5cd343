//! Decision types and response validation.
//!
//! The oracle is an untrusted external collaborator: its output is parsed
//! defensively (markdown fences, surrounding prose, trailing commas are
//! all things real models emit) and every decision is validated against
//! the candidate batch that was actually sent. A decision that fails
//! validation is logged and dropped — it never reaches execution.

use crate::error::{OracleError, Result};
use edgebet_kalshi::types::Side;
use edgebet_strategy::Candidate;
use serde::Deserialize;
use std::collections::HashSet;

/// A validated trade decision from the oracle.
#[derive(Debug, Clone)]
pub struct Decision {
    /// Market ticker. Guaranteed to refer to a candidate that was sent.
    pub ticker: String,

    /// Side to buy.
    pub side: Side,

    /// Oracle's probability estimate for the YES outcome, in [0, 1].
    pub probability: f64,

    /// Oracle's confidence in its own estimate, in [0, 1].
    pub confidence: f64,

    /// Recommended stake in cents, if the oracle suggested one.
    pub stake_hint_cents: Option<i64>,

    /// Free-text reasoning, for the ledger.
    pub reasoning: Option<String>,
}

/// An open position summarized into the oracle prompt.
#[derive(Debug, Clone)]
pub struct OpenPosition {
    /// Market ticker.
    pub ticker: String,

    /// Side held ("yes"/"no").
    pub side: String,

    /// Market title, when known.
    pub title: Option<String>,
}

/// Raw decision shape as the LLM emits it.
#[derive(Debug, Clone, Deserialize)]
struct RawDecision {
    /// "BET" or "PASS"; absent means BET.
    decision: Option<String>,
    ticker: Option<String>,
    side: Option<String>,
    #[serde(alias = "estimated_true_probability")]
    probability: Option<f64>,
    confidence: Option<serde_json::Value>,
    /// Stake in dollars.
    stake: Option<f64>,
    reasoning: Option<String>,
}

/// Strips markdown bolding the model sometimes sprinkles into strings.
fn clean_markdown(s: String) -> String {
    s.replace("**", "")
}

/// Coerces the confidence field: models emit either a number in [0,1] or
/// a label like "High"/"Medium"/"Low".
fn coerce_confidence(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "high" => Some(0.9),
            "medium" => Some(0.7),
            "low" => Some(0.5),
            other => other.parse().ok(),
        },
        _ => None,
    }
}

/// Extracts the JSON payload from a model reply, tolerating markdown code
/// fences and surrounding prose.
fn extract_json(content: &str) -> Option<&str> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let unfenced = unfenced.strip_suffix("```").unwrap_or(unfenced).trim();

    if unfenced.starts_with('{') || unfenced.starts_with('[') {
        return Some(unfenced);
    }

    // Prose around the payload: take the outermost braces/brackets.
    let start = unfenced.find(['{', '['])?;
    let end = unfenced.rfind(['}', ']'])?;
    (end > start).then(|| &unfenced[start..=end])
}

/// Validates one raw decision against the candidate batch.
fn validate(raw: RawDecision, sent: &HashSet<&str>) -> std::result::Result<Decision, String> {
    let ticker = raw.ticker.ok_or("missing ticker")?;
    if !sent.contains(ticker.as_str()) {
        return Err(format!("ticker {ticker} was not in the candidate batch"));
    }

    let side = raw
        .side
        .as_deref()
        .and_then(Side::parse)
        .ok_or_else(|| format!("unparseable side: {:?}", raw.side))?;

    let probability = raw.probability.ok_or("missing probability")?;
    if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
        return Err(format!("probability {probability} outside [0, 1]"));
    }

    let confidence = raw
        .confidence
        .as_ref()
        .and_then(coerce_confidence)
        .ok_or("missing or unparseable confidence")?;
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(format!("confidence {confidence} outside [0, 1]"));
    }

    let stake_hint_cents = match raw.stake {
        Some(dollars) if dollars.is_finite() && dollars > 0.0 => {
            Some((dollars * 100.0).round() as i64)
        }
        Some(dollars) => return Err(format!("non-positive stake: {dollars}")),
        None => None,
    };

    Ok(Decision {
        ticker,
        side,
        probability,
        confidence,
        stake_hint_cents,
        reasoning: raw.reasoning.map(clean_markdown),
    })
}

/// Parses and validates the oracle's reply.
///
/// Accepts a single decision object, an array of decisions, or an object
/// with a `decisions` array. `PASS` maps to zero decisions. Invalid
/// decisions are logged at warn and dropped rather than acted on.
///
/// # Errors
/// Returns [`OracleError::InvalidResponse`] only when no JSON payload can
/// be extracted at all.
pub fn parse_decisions(content: &str, candidates: &[Candidate]) -> Result<Vec<Decision>> {
    let payload = extract_json(content)
        .ok_or_else(|| OracleError::InvalidResponse("no JSON object in reply".to_string()))?;

    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| OracleError::InvalidResponse(format!("malformed JSON: {e}")))?;

    let raw_values: Vec<serde_json::Value> = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(ref obj) if obj.contains_key("decisions") => {
            match &obj["decisions"] {
                serde_json::Value::Array(items) => items.clone(),
                other => vec![other.clone()],
            }
        }
        other => vec![other],
    };

    let sent: HashSet<&str> = candidates.iter().map(Candidate::ticker).collect();
    let mut decisions = Vec::new();

    for raw_value in raw_values {
        let raw: RawDecision = match serde_json::from_value(raw_value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "dropping unparseable oracle decision");
                continue;
            }
        };

        if raw
            .decision
            .as_deref()
            .is_some_and(|d| d.eq_ignore_ascii_case("pass"))
        {
            tracing::info!(reasoning = ?raw.reasoning, "oracle passed on this batch");
            continue;
        }

        match validate(raw, &sent) {
            Ok(decision) => decisions.push(decision),
            Err(reason) => tracing::warn!(%reason, "dropping invalid oracle decision"),
        }
    }

    Ok(decisions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use edgebet_kalshi::types::{Market, MarketStatus};

    fn candidate(ticker: &str) -> Candidate {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
        let market = Market {
            ticker: ticker.to_string(),
            title: format!("Market {ticker}"),
            subtitle: None,
            status: MarketStatus::Open,
            yes_ask: Some(40),
            no_ask: Some(63),
            last_price: Some(41),
            volume: 100,
            liquidity: 100,
            close_time: Some(now + Duration::days(3)),
            rules: None,
            result: None,
        };
        Candidate::derive(market, now, 5).unwrap()
    }

    // ==================== Extraction Tests ====================

    #[test]
    fn test_extract_bare_json() {
        assert_eq!(extract_json(r#"{"a": 1}"#), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_extract_fenced_json() {
        let content = "```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json(content), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_json_with_prose() {
        let content = "Here is my analysis:\n{\"a\": 1}\nGood luck!";
        assert_eq!(extract_json(content), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_json_none() {
        assert_eq!(extract_json("no structured content here"), None);
    }

    // ==================== Parse Tests ====================

    #[test]
    fn test_parse_single_decision() {
        let candidates = vec![candidate("KXRT-A")];
        let content = r#"{
            "ticker": "KXRT-A",
            "side": "YES",
            "probability": 0.55,
            "confidence": 0.8,
            "stake": 10.0,
            "reasoning": "Base rate is **favorable**."
        }"#;

        let decisions = parse_decisions(content, &candidates).unwrap();
        assert_eq!(decisions.len(), 1);

        let d = &decisions[0];
        assert_eq!(d.ticker, "KXRT-A");
        assert_eq!(d.side, Side::Yes);
        assert!((d.probability - 0.55).abs() < f64::EPSILON);
        assert_eq!(d.stake_hint_cents, Some(1000));
        assert_eq!(d.reasoning.as_deref(), Some("Base rate is favorable."));
    }

    #[test]
    fn test_parse_pass() {
        let candidates = vec![candidate("KXRT-A")];
        let content = r#"{"decision": "PASS", "reasoning": "No edge today."}"#;

        let decisions = parse_decisions(content, &candidates).unwrap();
        assert!(decisions.is_empty());
    }

    #[test]
    fn test_parse_decisions_array() {
        let candidates = vec![candidate("KXRT-A"), candidate("KXRT-B")];
        let content = r#"{"decisions": [
            {"ticker": "KXRT-A", "side": "yes", "probability": 0.6, "confidence": 0.7},
            {"ticker": "KXRT-B", "side": "no", "probability": 0.3, "confidence": 0.9}
        ]}"#;

        let decisions = parse_decisions(content, &candidates).unwrap();
        assert_eq!(decisions.len(), 2);
        assert_eq!(decisions[1].side, Side::No);
    }

    #[test]
    fn test_parse_probability_alias() {
        let candidates = vec![candidate("KXRT-A")];
        let content = r#"{
            "ticker": "KXRT-A",
            "side": "yes",
            "estimated_true_probability": 0.65,
            "confidence": "High"
        }"#;

        let decisions = parse_decisions(content, &candidates).unwrap();
        assert!((decisions[0].probability - 0.65).abs() < f64::EPSILON);
        assert!((decisions[0].confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_garbage_is_invalid_response() {
        let candidates = vec![candidate("KXRT-A")];
        let err = parse_decisions("I cannot help with that.", &candidates).unwrap_err();
        assert!(matches!(err, OracleError::InvalidResponse(_)));
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_unknown_ticker_dropped() {
        // The oracle must not introduce markets we never asked about.
        let candidates = vec![candidate("KXRT-A")];
        let content = r#"{"ticker": "KXRT-HALLUCINATED", "side": "yes", "probability": 0.6, "confidence": 0.9}"#;

        let decisions = parse_decisions(content, &candidates).unwrap();
        assert!(decisions.is_empty());
    }

    #[test]
    fn test_probability_out_of_range_dropped() {
        let candidates = vec![candidate("KXRT-A")];
        for bad in ["1.2", "-0.1", "55"] {
            let content = format!(
                r#"{{"ticker": "KXRT-A", "side": "yes", "probability": {bad}, "confidence": 0.9}}"#
            );
            assert!(parse_decisions(&content, &candidates).unwrap().is_empty());
        }
    }

    #[test]
    fn test_bad_side_dropped() {
        let candidates = vec![candidate("KXRT-A")];
        let content = r#"{"ticker": "KXRT-A", "side": "maybe", "probability": 0.6, "confidence": 0.9}"#;
        assert!(parse_decisions(content, &candidates).unwrap().is_empty());
    }

    #[test]
    fn test_non_positive_stake_dropped() {
        let candidates = vec![candidate("KXRT-A")];
        let content = r#"{"ticker": "KXRT-A", "side": "yes", "probability": 0.6, "confidence": 0.9, "stake": -5.0}"#;
        assert!(parse_decisions(content, &candidates).unwrap().is_empty());
    }

    #[test]
    fn test_valid_among_invalid_survives() {
        let candidates = vec![candidate("KXRT-A"), candidate("KXRT-B")];
        let content = r#"[
            {"ticker": "KXRT-A", "side": "yes", "probability": 0.6, "confidence": 0.8},
            {"ticker": "KXRT-B", "side": "yes", "probability": 7.0, "confidence": 0.8}
        ]"#;

        let decisions = parse_decisions(content, &candidates).unwrap();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].ticker, "KXRT-A");
    }

    // ==================== Confidence Coercion Tests ====================

    #[test]
    fn test_confidence_labels() {
        assert_eq!(coerce_confidence(&serde_json::json!("High")), Some(0.9));
        assert_eq!(coerce_confidence(&serde_json::json!("medium")), Some(0.7));
        assert_eq!(coerce_confidence(&serde_json::json!("Low")), Some(0.5));
        assert_eq!(coerce_confidence(&serde_json::json!(0.75)), Some(0.75));
        assert_eq!(coerce_confidence(&serde_json::json!([1])), None);
    }
}
