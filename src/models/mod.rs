use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether the auctioned property is currently occupied or free.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Occupancy {
    Occupied,
    Free,
}

/// Buyer-supplied search criteria. All fields are optional; an absent field
/// means "no constraint on this dimension". Built once per search and
/// read-only afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Maximum auction price (EUR)
    pub max_price: Option<f64>,
    /// Minimum size in square meters
    pub min_size: Option<f64>,
    /// City or province to search in
    pub location: Option<String>,
    /// Rental/sale hint, e.g. "locazione"
    pub tenancy_type: Option<String>,
    /// Desired condition, e.g. "abitabile"
    pub condition: Option<String>,
    /// Property kind, e.g. "appartamento"
    pub property_kind: Option<String>,
}

impl SearchCriteria {
    pub fn with_max_price(mut self, max_price: f64) -> Self {
        self.max_price = Some(max_price);
        self
    }

    pub fn with_min_size(mut self, min_size: f64) -> Self {
        self.min_size = Some(min_size);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Normalized record for one discovered auction listing.
///
/// `price_per_m2` is derived: present iff both price and size are positive,
/// never supplied independently by a source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub title: String,
    pub location: String,
    pub price: f64,
    pub size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_m2: Option<f64>,
    pub rooms: u32,
    pub floor: String,
    pub condition: String,
    pub kind: String,
    pub occupancy: Occupancy,
    pub auction_date: String,
    pub url: String,
    pub scraped_at: DateTime<Utc>,
}

/// Compute the derived price-per-square-meter field, rounded to 2 decimals.
pub fn price_per_m2(price: f64, size: f64) -> Option<f64> {
    if price > 0.0 && size > 0.0 {
        Some((price / size * 100.0).round() / 100.0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_per_m2_requires_both_positive() {
        assert_eq!(price_per_m2(95_000.0, 85.0), Some(1117.65));
        assert_eq!(price_per_m2(95_000.0, 0.0), None);
        assert_eq!(price_per_m2(0.0, 85.0), None);
    }

    #[test]
    fn occupancy_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Occupancy::Occupied).unwrap(),
            "\"occupied\""
        );
        assert_eq!(serde_json::to_string(&Occupancy::Free).unwrap(), "\"free\"");
    }
}
