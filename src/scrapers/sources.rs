//! Static source configuration: the auction portals we query and how each
//! one expects search criteria on its query string.

use serde::{Deserialize, Serialize};

use crate::models::SearchCriteria;

/// One configured auction portal. Never mutated at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    pub base_url: String,
    pub search_url: String,
    /// Alias parameter names the location value is fanned out to; the
    /// portal's actual parameter name is unknown in advance, extra
    /// parameters are ignored server-side.
    pub location_params: Vec<String>,
    pub max_price_param: String,
    pub min_size_param: String,
    pub kind_param: String,
    pub condition_param: String,
    pub tenancy_param: String,
}

impl SourceDescriptor {
    fn portal(name: &str, base_url: &str, search_url: &str) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            search_url: search_url.to_string(),
            location_params: vec![
                "comune".to_string(),
                "citta".to_string(),
                "provincia".to_string(),
            ],
            max_price_param: "prezzoMax".to_string(),
            min_size_param: "superficieMin".to_string(),
            kind_param: "tipologia".to_string(),
            condition_param: "stato".to_string(),
            tenancy_param: "locazione".to_string(),
        }
    }

    /// Map non-absent criteria fields to this portal's query parameters.
    /// Numeric bounds are truncated to whole units, the way the portals
    /// expect them.
    pub fn query_params(&self, criteria: &SearchCriteria) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(location) = &criteria.location {
            for name in &self.location_params {
                params.push((name.clone(), location.clone()));
            }
        }
        if let Some(max_price) = criteria.max_price {
            params.push((self.max_price_param.clone(), format!("{}", max_price as i64)));
        }
        if let Some(min_size) = criteria.min_size {
            params.push((self.min_size_param.clone(), format!("{}", min_size as i64)));
        }
        if let Some(kind) = &criteria.property_kind {
            params.push((self.kind_param.clone(), kind.clone()));
        }
        if let Some(condition) = &criteria.condition {
            params.push((self.condition_param.clone(), condition.clone()));
        }
        if let Some(tenancy) = &criteria.tenancy_type {
            params.push((self.tenancy_param.clone(), tenancy.clone()));
        }
        params
    }
}

/// The fixed portal list, in priority order. Earlier sources win under the
/// orchestrator's early-stop rule.
pub fn default_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor::portal(
            "astagiudiziaria",
            "https://www.astagiudiziaria.com",
            "https://www.astagiudiziaria.com/ricerca/immobili",
        ),
        SourceDescriptor::portal(
            "astegiudiziarie",
            "https://www.astegiudiziarie.it",
            "https://www.astegiudiziarie.it/immobili",
        ),
        SourceDescriptor::portal(
            "astalegale",
            "https://www.astalegale.net",
            "https://www.astalegale.net/risultati-ricerca",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_fans_out_to_alias_params() {
        let descriptor = &default_sources()[0];
        let criteria = SearchCriteria::default().with_location("Reggio Emilia");
        let params = descriptor.query_params(&criteria);
        let names: Vec<&str> = params.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["comune", "citta", "provincia"]);
        assert!(params.iter().all(|(_, v)| v == "Reggio Emilia"));
    }

    #[test]
    fn numeric_bounds_are_truncated() {
        let descriptor = &default_sources()[0];
        let criteria = SearchCriteria::default()
            .with_max_price(150_000.9)
            .with_min_size(70.5);
        let params = descriptor.query_params(&criteria);
        assert!(params.contains(&("prezzoMax".to_string(), "150000".to_string())));
        assert!(params.contains(&("superficieMin".to_string(), "70".to_string())));
    }

    #[test]
    fn absent_criteria_produce_no_params() {
        let descriptor = &default_sources()[0];
        assert!(descriptor.query_params(&SearchCriteria::default()).is_empty());
    }

    #[test]
    fn three_portals_in_priority_order() {
        let sources = default_sources();
        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0].name, "astagiudiziaria");
        assert_eq!(sources[2].name, "astalegale");
    }
}
