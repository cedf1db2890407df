//! Canonical property schema and per-run summary types.

use serde::{Deserialize, Serialize};

/// A normalized rental listing, the unit handed to the persistence API.
///
/// Numeric fields stay string-typed (digits only) to match the storage
/// contract; the persistence layer upserts by `url`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub address: String,

    /// Monthly rent, digits only.
    pub price: String,

    /// Surface in square meters, digits only. Empty when unknown.
    #[serde(default)]
    pub area: String,

    /// Digits only. Empty when unknown.
    #[serde(default)]
    pub bedrooms: String,

    /// One of `A++, A+, A, B, C, D, E, F, G`, or empty when invalid.
    #[serde(default)]
    pub energy_label: String,

    #[serde(default)]
    pub furnished: bool,

    #[serde(default)]
    pub including_bills: bool,

    /// One of `available`, `rented`, `option`.
    #[serde(default)]
    pub status: String,

    /// ISO date `YYYY-MM-DD`, or empty when unparseable.
    #[serde(default)]
    pub available_from: String,

    /// Fully-qualified listing URL; the upsert key in the persistence layer.
    pub url: String,

    /// Stamped by the orchestrator, never by extraction.
    #[serde(default)]
    pub broker: String,
}

/// Summary of one per-broker scrape invocation.
///
/// Written to the plain-text scraping report; never persisted to the
/// document store.
#[derive(Debug, Clone)]
pub struct ScrapingResult {
    pub broker_name: String,
    pub success: bool,
    pub error_message: String,
    pub properties_found: usize,
    pub properties_saved: usize,
    pub time_taken_secs: f64,
}

impl ScrapingResult {
    #[must_use]
    pub fn new(broker_name: &str) -> Self {
        Self {
            broker_name: broker_name.to_string(),
            success: false,
            error_message: String::new(),
            properties_found: 0,
            properties_saved: 0,
            time_taken_secs: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_record_round_trips_through_json() {
        let record = PropertyRecord {
            address: "Oudegracht 1".to_string(),
            price: "1250".to_string(),
            area: "75".to_string(),
            bedrooms: "2".to_string(),
            energy_label: "B".to_string(),
            furnished: true,
            including_bills: false,
            status: "available".to_string(),
            available_from: "2025-04-01".to_string(),
            url: "https://yourhouse.example/listing/5".to_string(),
            broker: "YourHouse".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: PropertyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.address, "Oudegracht 1");
        assert!(back.furnished);
        assert_eq!(back.url, "https://yourhouse.example/listing/5");
    }

    #[test]
    fn property_record_deserializes_with_missing_optional_fields() {
        let json = r#"{"address": "Somewhere 2", "price": "900", "url": "https://x/1"}"#;
        let record: PropertyRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.price, "900");
        assert!(!record.furnished);
        assert_eq!(record.energy_label, "");
    }

    #[test]
    fn scraping_result_starts_unsuccessful() {
        let result = ScrapingResult::new("YourHouse");
        assert_eq!(result.broker_name, "YourHouse");
        assert!(!result.success);
        assert_eq!(result.properties_found, 0);
    }
}
