//! Field-level extraction: turns one candidate unit (a structured JSON
//! object or a markup fragment) into a normalized [`Listing`], or `None`
//! when the unit carries neither a usable price nor a usable size.
//!
//! Markup matching is an ordered list of named pattern functions, each a
//! pure `&str -> Option<_>`, so every fallback step is testable on its own.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::models::{price_per_m2, Listing, Occupancy};
use crate::parse::{parse_area, parse_price};

const DEFAULT_TITLE: &str = "Immobile in asta";
const DEFAULT_FLOOR: &str = "Non specificato";
const DEFAULT_CONDITION: &str = "Da verificare";
const DEFAULT_KIND: &str = "Immobile";
const DEFAULT_DATE: &str = "Da definire";

const MAX_TITLE_CHARS: usize = 200;

static PROVINCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([A-Z]{2})\)").unwrap());

static CITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(Roma|Milano|Napoli|Torino|Palermo|Genova|Bologna|Firenze|Bari|Catania|Venezia|Verona|Reggio\s+Emilia|Modena|Parma|Piacenza|Brescia)\b",
    )
    .unwrap()
});

static ROOMS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s*(?:local|vani|stanze)").unwrap());

static FLOOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(terra|rialzato|primo|secondo|terzo|quarto|attico)\b|\d+°").unwrap());

static CONDITION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(abitabile|da ristrutturare|nuovo|ottimo stato|buono stato)").unwrap());

static KIND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(appartamento|casa|attico|villa|loft|bilocale|trilocale)").unwrap());

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,2}/\d{1,2}/\d{4}").unwrap());

static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("h2, h3, h4, a").unwrap());
static LINK_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Province-code parenthetical, e.g. "(RE)". Kept verbatim, parens included.
pub fn match_province(text: &str) -> Option<String> {
    PROVINCE_RE.find(text).map(|m| m.as_str().to_string())
}

/// One of the known city names.
pub fn match_city(text: &str) -> Option<String> {
    CITY_RE.find(text).map(|m| m.as_str().to_string())
}

/// Province code first, city vocabulary second.
pub fn match_location(text: &str) -> Option<String> {
    match_province(text).or_else(|| match_city(text))
}

/// Rooms count followed by a "locali/vani/stanze" marker.
pub fn match_rooms(text: &str) -> Option<u32> {
    ROOMS_RE
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Floor descriptor from the fixed vocabulary, or an ordinal like "3°".
pub fn match_floor(text: &str) -> Option<String> {
    FLOOR_RE.find(text).map(|m| capitalize(m.as_str()))
}

/// Condition descriptor from the fixed vocabulary.
pub fn match_condition(text: &str) -> Option<String> {
    CONDITION_RE.find(text).map(|m| capitalize(m.as_str()))
}

/// Property-kind descriptor from the fixed vocabulary.
pub fn match_kind(text: &str) -> Option<String> {
    KIND_RE.find(text).map(|m| capitalize(m.as_str()))
}

/// Auction date token, D{1,2}/D{1,2}/D{4}.
pub fn match_date(text: &str) -> Option<String> {
    DATE_RE.find(text).map(|m| m.as_str().to_string())
}

/// Occupancy keyword scan.
pub fn match_occupancy(text: &str) -> Occupancy {
    if text.to_lowercase().contains("occupato") {
        Occupancy::Occupied
    } else {
        Occupancy::Free
    }
}

/// Map a structured unit (ld+json item or script-state object) to a Listing.
///
/// Key aliases degrade gracefully; a unit with neither a positive price nor
/// a positive size is discarded.
pub fn from_structured(item: &Value, base_url: &str) -> Option<Listing> {
    let obj = item.as_object()?;

    let title = ["name", "title", "headline"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE);

    let price = match obj.get("offers") {
        Some(Value::Object(offers)) => offers.get("price").map(number).unwrap_or(0.0),
        Some(Value::Array(offers)) => offers
            .first()
            .and_then(|o| o.get("price"))
            .map(number)
            .unwrap_or(0.0),
        _ => obj.get("price").map(number).unwrap_or(0.0),
    };

    let size = match obj.get("floorSize") {
        Some(Value::Object(fs)) => fs.get("value").map(number).unwrap_or(0.0),
        Some(fs) => number(fs),
        None => obj.get("area").map(number).unwrap_or(0.0),
    };

    if price <= 0.0 && size <= 0.0 {
        debug!("Discarding structured unit without price or size");
        return None;
    }

    let location = match obj.get("address") {
        Some(Value::Object(addr)) => ["addressLocality", "addressRegion"]
            .iter()
            .find_map(|k| addr.get(*k).and_then(Value::as_str))
            .unwrap_or("")
            .to_string(),
        Some(Value::String(addr)) => addr.clone(),
        _ => String::new(),
    };

    let rooms = ["rooms", "bedrooms"]
        .iter()
        .find_map(|k| obj.get(*k).map(number))
        .unwrap_or(0.0)
        .max(0.0) as u32;

    let condition = ["condition", "state"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CONDITION);

    let kind = ["propertyType", "type"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .filter(|k| !k.is_empty())
        .unwrap_or(DEFAULT_KIND);

    let description = obj.get("description").and_then(Value::as_str).unwrap_or("");
    let occupancy = match obj.get("occupancy").and_then(Value::as_str) {
        Some(o) => match_occupancy(o),
        None => match_occupancy(description),
    };

    let auction_date = ["auctionDate", "date"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .unwrap_or(DEFAULT_DATE);

    let url = resolve_url(base_url, obj.get("url").and_then(Value::as_str));

    Some(Listing {
        title: truncate_title(title),
        location,
        price,
        size,
        price_per_m2: price_per_m2(price, size),
        rooms,
        floor: obj
            .get("floor")
            .and_then(Value::as_str)
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_FLOOR)
            .to_string(),
        condition: condition.to_string(),
        kind: kind.to_string(),
        occupancy,
        auction_date: auction_date.to_string(),
        url,
        scraped_at: Utc::now(),
    })
}

/// Map one heuristically-found markup fragment to a Listing.
pub fn from_fragment(fragment: ElementRef, base_url: &str) -> Option<Listing> {
    let text = fragment.text().collect::<Vec<_>>().join(" ");

    let title = fragment
        .select(&TITLE_SEL)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let href = fragment
        .select(&LINK_SEL)
        .next()
        .and_then(|a| a.value().attr("href"));

    build_listing(&text, title.as_deref(), href, base_url)
}

/// Text-level core of fragment extraction, separated from the DOM walk so
/// the pattern chain can be exercised directly.
fn build_listing(
    text: &str,
    title: Option<&str>,
    href: Option<&str>,
    base_url: &str,
) -> Option<Listing> {
    let price = parse_price(text);
    let size = parse_area(text);

    // Sole validity gate: a fragment with neither price nor size is noise.
    if price <= 0.0 && size <= 0.0 {
        return None;
    }

    Some(Listing {
        title: truncate_title(title.unwrap_or(DEFAULT_TITLE)),
        location: match_location(text).unwrap_or_default(),
        price,
        size,
        price_per_m2: price_per_m2(price, size),
        rooms: match_rooms(text).unwrap_or(0),
        floor: match_floor(text).unwrap_or_else(|| DEFAULT_FLOOR.to_string()),
        condition: match_condition(text).unwrap_or_else(|| DEFAULT_CONDITION.to_string()),
        kind: match_kind(text).unwrap_or_else(|| DEFAULT_KIND.to_string()),
        occupancy: match_occupancy(text),
        auction_date: match_date(text).unwrap_or_else(|| DEFAULT_DATE.to_string()),
        url: resolve_url(base_url, href),
        scraped_at: Utc::now(),
    })
}

/// Resolve an href against the source base URL; the base itself is the
/// fallback for missing or unparsable links.
pub fn resolve_url(base_url: &str, href: Option<&str>) -> String {
    let Some(href) = href else {
        return base_url.to_string();
    };
    match Url::parse(base_url).and_then(|base| base.join(href)) {
        Ok(joined) => joined.to_string(),
        Err(_) => base_url.to_string(),
    }
}

fn truncate_title(title: &str) -> String {
    title.chars().take(MAX_TITLE_CHARS).collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn number(v: &Value) -> f64 {
    match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;
    use serde_json::json;

    #[test]
    fn pattern_chain_on_card_text() {
        let text = "Appartamento abitabile, 3 locali, piano terra, 70 mq, \
                    € 95.000 - Reggio Emilia (RE) - asta del 12/03/2025, occupato";
        assert_eq!(match_location(text).as_deref(), Some("(RE)"));
        assert_eq!(match_rooms(text), Some(3));
        assert_eq!(match_floor(text).as_deref(), Some("Terra"));
        assert_eq!(match_condition(text).as_deref(), Some("Abitabile"));
        assert_eq!(match_kind(text).as_deref(), Some("Appartamento"));
        assert_eq!(match_date(text).as_deref(), Some("12/03/2025"));
        assert_eq!(match_occupancy(text), Occupancy::Occupied);
    }

    #[test]
    fn city_vocabulary_is_the_fallback_for_location() {
        let text = "Trilocale a Reggio Emilia, € 88.000";
        assert_eq!(match_location(text).as_deref(), Some("Reggio Emilia"));
    }

    #[test]
    fn structured_unit_with_schema_org_shape() {
        let item = json!({
            "name": "Appartamento in asta",
            "offers": { "price": "95000" },
            "floorSize": { "value": 85 },
            "address": { "addressLocality": "Reggio Emilia" },
            "url": "/lotti/123"
        });
        let listing = from_structured(&item, "https://www.astagiudiziaria.com").unwrap();
        assert_eq!(listing.price, 95_000.0);
        assert_eq!(listing.size, 85.0);
        assert_eq!(listing.price_per_m2, Some(1117.65));
        assert_eq!(listing.location, "Reggio Emilia");
        assert_eq!(listing.url, "https://www.astagiudiziaria.com/lotti/123");
    }

    #[test]
    fn structured_unit_without_price_or_size_is_discarded() {
        let item = json!({ "name": "Lotto 7", "url": "/lotti/7" });
        assert!(from_structured(&item, "https://example.it").is_none());
    }

    #[test]
    fn structured_offers_list_takes_first_price() {
        let item = json!({
            "title": "Casa indipendente",
            "offers": [ { "price": 120000 }, { "price": 80000 } ]
        });
        let listing = from_structured(&item, "https://example.it").unwrap();
        assert_eq!(listing.price, 120_000.0);
        // Size is unknown, so the derived field stays absent.
        assert_eq!(listing.price_per_m2, None);
    }

    #[test]
    fn fragment_extraction_reads_title_and_link() {
        let html = Html::parse_fragment(
            r#"<div class="asta-card">
                 <h3>Appartamento via Roma 1</h3>
                 <a href="/annunci/42">dettagli</a>
                 <p>€ 95.000,50 - 85 mq - Reggio Emilia (RE)</p>
               </div>"#,
        );
        let sel = Selector::parse("div").unwrap();
        let root = html.select(&sel).next().unwrap();
        let listing = from_fragment(root, "https://www.astegiudiziarie.it").unwrap();
        assert_eq!(listing.title, "Appartamento via Roma 1");
        assert_eq!(listing.url, "https://www.astegiudiziarie.it/annunci/42");
        assert_eq!(listing.price, 95_000.50);
        assert_eq!(listing.size, 85.0);
        assert_eq!(listing.location, "(RE)");
    }

    #[test]
    fn fragment_without_numbers_is_rejected() {
        let html = Html::parse_fragment(r#"<div class="asta"><a href="/x">vedi</a></div>"#);
        let sel = Selector::parse("div").unwrap();
        let root = html.select(&sel).next().unwrap();
        assert!(from_fragment(root, "https://example.it").is_none());
    }

    #[test]
    fn long_titles_are_truncated() {
        let item = json!({ "name": "x".repeat(500), "price": 1000 });
        let listing = from_structured(&item, "https://example.it").unwrap();
        assert_eq!(listing.title.chars().count(), 200);
    }

    #[test]
    fn relative_urls_resolve_against_base() {
        assert_eq!(
            resolve_url("https://example.it/ricerca", Some("/lotti/9")),
            "https://example.it/lotti/9"
        );
        assert_eq!(
            resolve_url("https://example.it", Some("https://other.it/a")),
            "https://other.it/a"
        );
        assert_eq!(resolve_url("https://example.it/", None), "https://example.it/");
    }
}
