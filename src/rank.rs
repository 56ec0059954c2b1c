//! Hard-criteria filtering and relevance scoring.
//!
//! Price ceiling, size floor and location containment exclude listings
//! outright; tenancy, condition and kind hints only affect the score.

use crate::models::{Listing, SearchCriteria};

const PRICE_WEIGHT: f64 = 40.0;
const SIZE_WEIGHT: f64 = 25.0;
const LOCATION_EXACT: u32 = 20;
const LOCATION_SUBSTRING: u32 = 12;
const LOCATION_WORD: u32 = 6;
const HINT_BONUS: u32 = 4;

/// Hard-criteria gate. A listing passes when every *present* hard criterion
/// holds; absent criteria never exclude anything.
pub fn passes(listing: &Listing, criteria: &SearchCriteria) -> bool {
    if let Some(max_price) = criteria.max_price {
        if listing.price > max_price {
            return false;
        }
    }
    if let Some(min_size) = criteria.min_size {
        if listing.size < min_size {
            return false;
        }
    }
    if let Some(location) = &criteria.location {
        if !listing
            .location
            .to_lowercase()
            .contains(&location.to_lowercase())
        {
            return false;
        }
    }
    true
}

/// Relevance score in [0, 100]. Pure function: additive bonuses for present
/// criteria only, each component clamped before summing.
pub fn match_score(listing: &Listing, criteria: &SearchCriteria) -> u32 {
    let mut score = 0u32;

    // Price headroom below the ceiling, up to 40 points.
    if let Some(max_price) = criteria.max_price {
        if max_price > 0.0 && listing.price > 0.0 {
            let ratio = ((max_price - listing.price) / max_price).max(0.0);
            score += (ratio * PRICE_WEIGHT).min(PRICE_WEIGHT) as u32;
        }
    }

    // Size margin above the floor, up to 25 points.
    if let Some(min_size) = criteria.min_size {
        if min_size > 0.0 && listing.size > 0.0 {
            let ratio = ((listing.size - min_size) / listing.size.max(1.0)).max(0.0);
            score += (ratio * SIZE_WEIGHT).min(SIZE_WEIGHT) as u32;
        }
    }

    // Location match, highest applicable tier only.
    if let Some(location) = &criteria.location {
        if !listing.location.is_empty() {
            let wanted = location.to_lowercase();
            let actual = listing.location.to_lowercase();
            let first_segment = actual.split(',').next().unwrap_or("").trim();
            if wanted == first_segment {
                score += LOCATION_EXACT;
            } else if actual.contains(&wanted) {
                score += LOCATION_SUBSTRING;
            } else if wanted.split_whitespace().any(|w| actual.contains(w)) {
                score += LOCATION_WORD;
            }
        }
    }

    // Tenancy hint found in kind + condition text.
    if let Some(tenancy) = &criteria.tenancy_type {
        if !listing.kind.is_empty() {
            let haystack = format!("{} {}", listing.kind, listing.condition).to_lowercase();
            if haystack.contains(&tenancy.to_lowercase()) {
                score += HINT_BONUS;
            }
        }
    }

    // Condition hint.
    if let Some(condition) = &criteria.condition {
        if listing
            .condition
            .to_lowercase()
            .contains(&condition.to_lowercase())
        {
            score += HINT_BONUS;
        }
    }

    score.min(100)
}
