//! Heuristic markup extraction for pages without usable structured data.
//!
//! Fragment discovery walks an ordered list of selector strategies; the
//! first one yielding any matches wins outright. Strategies are fallbacks,
//! never merged, so a page that matches the class-pattern strategy is not
//! also scanned for literal class names.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::extract::field;
use crate::models::Listing;

/// Upper bound on fragments considered per page.
const MAX_FRAGMENTS: usize = 50;

/// Listing-like class-name pattern shared by the Italian auction portals.
static CARD_CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)asta|lotto|property|immobile|card|risultato|inserzione").unwrap());

static DIV_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("div").unwrap());
static RESULT_ITEM_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("div.result-item").unwrap());
static LISTING_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("div.listing").unwrap());
static DATA_ID_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("div[data-id]").unwrap());
static DATA_LOTTO_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("div[data-lotto]").unwrap());
static ALT_TAGS_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("article, li").unwrap());

/// Extract listings from raw markup. One bad fragment never aborts the
/// batch; it is simply skipped.
pub fn extract(html: &str, base_url: &str) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let fragments = find_fragments(&document);
    debug!("Heuristic pass over {} fragments", fragments.len());

    fragments
        .into_iter()
        .filter_map(|fragment| field::from_fragment(fragment, base_url))
        .collect()
}

/// Ordered fragment-selection strategies; first non-empty result wins.
pub fn find_fragments(document: &Html) -> Vec<ElementRef<'_>> {
    let found = divs_with_card_class(document);
    if !found.is_empty() {
        return cap(found);
    }

    for selector in [&*RESULT_ITEM_SEL, &*LISTING_SEL, &*DATA_ID_SEL, &*DATA_LOTTO_SEL] {
        let found: Vec<_> = document.select(selector).collect();
        if !found.is_empty() {
            return cap(found);
        }
    }

    // Broaden to alternate tag kinds, still gated on the class pattern.
    cap(document
        .select(&ALT_TAGS_SEL)
        .filter(|el| has_card_class(el))
        .collect())
}

fn divs_with_card_class(document: &Html) -> Vec<ElementRef<'_>> {
    document
        .select(&DIV_SEL)
        .filter(|el| has_card_class(el))
        .collect()
}

fn has_card_class(el: &ElementRef<'_>) -> bool {
    el.value()
        .attr("class")
        .map(|c| CARD_CLASS_RE.is_match(c))
        .unwrap_or(false)
}

fn cap(mut fragments: Vec<ElementRef<'_>>) -> Vec<ElementRef<'_>> {
    fragments.truncate(MAX_FRAGMENTS);
    fragments
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.astalegale.net";

    #[test]
    fn card_class_pattern_strategy_wins() {
        let html = Html::parse_document(
            r#"<html><body>
                 <div class="risultato-asta">€ 95.000 - 85 mq</div>
                 <div class="result-item">€ 10.000 - 20 mq</div>
               </body></html>"#,
        );
        let fragments = find_fragments(&html);
        // The literal-class strategy is never consulted once the pattern
        // strategy has matches.
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].value().attr("class").unwrap().contains("risultato"));
    }

    #[test]
    fn literal_class_strategy_is_the_fallback() {
        let html = Html::parse_document(
            r#"<html><body>
                 <div class="result-item">€ 10.000 - 20 mq</div>
                 <div class="result-item">€ 12.000 - 25 mq</div>
               </body></html>"#,
        );
        assert_eq!(find_fragments(&html).len(), 2);
    }

    #[test]
    fn data_attribute_strategies_apply() {
        let html = Html::parse_document(
            r#"<html><body><div data-lotto="7">€ 40.000, 50 mq</div></body></html>"#,
        );
        assert_eq!(find_fragments(&html).len(), 1);
    }

    #[test]
    fn alternate_tags_broaden_the_search() {
        let html = Html::parse_document(
            r#"<html><body><ul>
                 <li class="lotto-123">€ 55.000 - 60 mq</li>
                 <li class="nav-item">menu</li>
               </ul></body></html>"#,
        );
        assert_eq!(find_fragments(&html).len(), 1);
    }

    #[test]
    fn fragment_count_is_capped() {
        let cards: String = (0..80)
            .map(|i| format!(r#"<div class="asta-card">€ {}.000 - 50 mq</div>"#, i + 1))
            .collect();
        let html = Html::parse_document(&format!("<html><body>{cards}</body></html>"));
        assert_eq!(find_fragments(&html).len(), 50);
    }

    #[test]
    fn bad_fragments_are_skipped_individually() {
        let html = r#"<html><body>
            <div class="asta-card">solo testo, niente numeri</div>
            <div class="asta-card">€ 75.000 - 80 mq - Parma</div>
        </body></html>"#;
        let listings = extract(html, BASE);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].location, "Parma");
    }

    #[test]
    fn garbled_markup_yields_nothing() {
        let listings = extract("<<<%%% not html at all €€€", BASE);
        assert!(listings.is_empty());
    }
}
