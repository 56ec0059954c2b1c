//! Structured-data extraction: schema.org `ld+json` item lists and inline
//! script-carried JSON state blobs.
//!
//! Detection never errors. A malformed payload simply yields nothing, which
//! lets the caller fall back to heuristic markup parsing.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use crate::extract::field;
use crate::models::Listing;

/// Inline-script markers that signal a global-state JSON assignment.
const STATE_MARKERS: [&str; 3] = ["window.__DATA__", "window.initialData", "var listings"];

/// Conventional collection keys probed, in order, when the payload is an
/// object rather than a list.
const COLLECTION_KEYS: [&str; 5] = ["listings", "offers", "results", "items", "properties"];

static LD_JSON_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());

static SCRIPT_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("script").unwrap());

/// Extract listings from any structured data embedded in the page.
/// Empty when the page carries none (or only malformed payloads).
pub fn extract(html: &str, base_url: &str) -> Vec<Listing> {
    match find_structured_data(html) {
        Some(data) => map_to_listings(&data, base_url),
        None => Vec::new(),
    }
}

/// Locate the first parseable structured payload in the page.
///
/// Order: `ld+json` scripts first, then any inline script carrying a
/// known global-state marker, from which the first balanced brace or
/// bracket span is taken.
pub fn find_structured_data(html: &str) -> Option<Value> {
    let document = Html::parse_document(html);

    for script in document.select(&LD_JSON_SEL) {
        let raw = script.text().collect::<String>();
        match serde_json::from_str::<Value>(&raw) {
            Ok(data) if data.is_object() || data.is_array() => return Some(data),
            _ => continue,
        }
    }

    for script in document.select(&SCRIPT_SEL) {
        let raw = script.text().collect::<String>();
        if !STATE_MARKERS.iter().any(|m| raw.contains(m)) {
            continue;
        }
        let Some(span) = balanced_json_span(&raw) else {
            continue;
        };
        match serde_json::from_str::<Value>(span) {
            Ok(data) if data.is_object() || data.is_array() => return Some(data),
            _ => {
                debug!("Script-state span did not parse as JSON, skipping");
                continue;
            }
        }
    }

    None
}

/// Map a raw structured payload to listings.
///
/// A list is taken as-is; an `itemListElement` container or one of the
/// conventional collection keys is probed otherwise. Wrapper objects
/// holding a nested `item` are unwrapped before field extraction.
pub fn map_to_listings(data: &Value, base_url: &str) -> Vec<Listing> {
    let items: &[Value] = match data {
        Value::Array(list) => list,
        Value::Object(obj) => {
            if let Some(Value::Array(list)) = obj.get("itemListElement") {
                list
            } else if let Some(list) = COLLECTION_KEYS
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_array))
            {
                list
            } else {
                return Vec::new();
            }
        }
        _ => return Vec::new(),
    };

    items
        .iter()
        .map(|item| match item.get("item") {
            Some(inner @ Value::Object(_)) => inner,
            _ => item,
        })
        .filter_map(|item| field::from_structured(item, base_url))
        .collect()
}

/// First balanced `{…}` or `[…]` span in a script body, string-literal
/// aware so braces inside JSON strings do not unbalance the scan.
fn balanced_json_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let bytes = text.as_bytes();
    let (open, close) = match bytes[start] {
        b'{' => (b'{', b'}'),
        _ => (b'[', b']'),
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            _ if b == open => depth += 1,
            _ if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    None
}
