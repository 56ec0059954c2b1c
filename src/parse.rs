//! Locale-aware numeric token parsing for Italian listing text.
//!
//! Auction pages write prices as "€ 95.000,50" (thousands dot, decimal
//! comma, sometimes space-grouped) and surfaces as "85 mq" / "85 m²".
//! A missing token is not an error: both parsers return 0.0 so that
//! absence of data propagates as a zero default downstream.

use once_cell::sync::Lazy;
use regex::Regex;

static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"€\s*([0-9.\s]+(?:,[0-9]{2})?)").unwrap());

static AREA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(?:mq|m²|m2|metri)").unwrap());

/// Extract the first euro-marked price from free text.
///
/// Returns 0.0 when no currency-marked token is present.
pub fn parse_price(text: &str) -> f64 {
    let Some(caps) = PRICE_RE.captures(text) else {
        return 0.0;
    };
    let normalized = caps[1]
        .trim()
        .replace([' ', '.'], "")
        .replace(',', ".");
    normalized.parse().unwrap_or(0.0)
}

/// Extract the first area token followed by a square-meter unit marker.
///
/// Returns 0.0 when no unit-marked token is present.
pub fn parse_area(text: &str) -> f64 {
    let Some(caps) = AREA_RE.captures(text) else {
        return 0.0;
    };
    caps[1].replace(',', ".").parse().unwrap_or(0.0)
}
