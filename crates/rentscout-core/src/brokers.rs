//! Broker site definitions loaded from `config/brokers.json`.
//!
//! Each broker entry describes one rental site's shape: where the search
//! results live (`url` template), how to select listing nodes
//! (`listing_selector`), and whether per-listing detail pages are worth
//! fetching. The struct is read-only after load.

use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

/// Static description of one broker website.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    pub name: String,

    /// Base origin of the site. Normalized by [`load_brokers`] to always
    /// carry a scheme so relative listing URLs can be qualified against it.
    pub domain: String,

    /// Search-results URL template containing an `{area}` placeholder and
    /// optionally a `{max_price}` placeholder.
    #[serde(rename = "url")]
    pub url_template: String,

    /// CSS selector matching each listing node on the results page.
    pub listing_selector: String,

    /// Pagination control. Part of the site description but not consumed by
    /// the scrape loop (single-page runs only).
    #[serde(default)]
    pub next_button_selector: Option<String>,

    /// Cookie-consent modal, for sites that overlay one on first visit.
    #[serde(default)]
    pub cookie_modal_selector: Option<String>,

    /// Whether the per-listing detail page should be fetched and appended to
    /// the listing fragment before extraction.
    #[serde(default)]
    pub fetch_detail_pages: bool,
}

#[derive(Debug, Deserialize)]
struct BrokersFile {
    #[serde(default)]
    brokers: Vec<BrokerConfig>,
}

impl BrokerConfig {
    /// Substitutes `{area}` into the URL template.
    ///
    /// Pure string substitution; the result is not validated for
    /// reachability. Templates without the placeholder are returned
    /// unchanged, intentional for brokers with a fixed results URL.
    #[must_use]
    pub fn url_for_area(&self, area: &str) -> String {
        self.url_template.replace("{area}", area)
    }

    /// Substitutes `{max_price}` into the URL template, when present.
    pub fn apply_max_price(&mut self, max_price: u32) {
        self.url_template = self
            .url_template
            .replace("{max_price}", &max_price.to_string());
    }
}

/// Prefixes `https://` when the configured domain carries no scheme.
fn normalize_domain(domain: &str) -> String {
    let trimmed = domain.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Loads broker configurations from a JSON file.
///
/// # Errors
///
/// Returns [`ConfigError::BrokersFile`] when the file cannot be read or does
/// not parse as the expected `{ "brokers": [...] }` shape.
pub fn load_brokers(path: &Path) -> Result<Vec<BrokerConfig>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::BrokersFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let parsed: BrokersFile =
        serde_json::from_str(&raw).map_err(|e| ConfigError::BrokersFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    let brokers: Vec<BrokerConfig> = parsed
        .brokers
        .into_iter()
        .map(|mut b| {
            b.domain = normalize_domain(&b.domain);
            b
        })
        .collect();

    tracing::info!(count = brokers.len(), path = %path.display(), "loaded broker configurations");
    Ok(brokers)
}

/// Finds a broker by name, case-insensitively.
#[must_use]
pub fn find_broker<'a>(brokers: &'a [BrokerConfig], name: &str) -> Option<&'a BrokerConfig> {
    brokers
        .iter()
        .find(|b| b.name.eq_ignore_ascii_case(name))
}

/// Like [`find_broker`], but an unknown name is a [`ConfigError`].
///
/// # Errors
///
/// Returns [`ConfigError::BrokerNotFound`] when no configured broker matches.
pub fn require_broker<'a>(
    brokers: &'a [BrokerConfig],
    name: &str,
) -> Result<&'a BrokerConfig, ConfigError> {
    find_broker(brokers, name).ok_or_else(|| ConfigError::BrokerNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broker_with_template(template: &str) -> BrokerConfig {
        BrokerConfig {
            name: "YourHouse".to_string(),
            domain: "https://yourhouse.example".to_string(),
            url_template: template.to_string(),
            listing_selector: "div.listing".to_string(),
            next_button_selector: None,
            cookie_modal_selector: None,
            fetch_detail_pages: false,
        }
    }

    #[test]
    fn url_for_area_substitutes_placeholder() {
        let broker = broker_with_template("https://yourhouse.example/rent/{area}");
        assert_eq!(
            broker.url_for_area("utrecht"),
            "https://yourhouse.example/rent/utrecht"
        );
    }

    #[test]
    fn url_for_area_without_placeholder_returns_template_unchanged() {
        let broker = broker_with_template("https://yourhouse.example/rentals");
        assert_eq!(
            broker.url_for_area("utrecht"),
            "https://yourhouse.example/rentals"
        );
    }

    #[test]
    fn apply_max_price_substitutes_placeholder() {
        let mut broker =
            broker_with_template("https://yourhouse.example/rent/{area}?max={max_price}");
        broker.apply_max_price(2000);
        assert_eq!(
            broker.url_for_area("utrecht"),
            "https://yourhouse.example/rent/utrecht?max=2000"
        );
    }

    #[test]
    fn normalize_domain_adds_scheme() {
        assert_eq!(
            normalize_domain("yourhouse.example"),
            "https://yourhouse.example"
        );
    }

    #[test]
    fn normalize_domain_keeps_existing_scheme_and_strips_trailing_slash() {
        assert_eq!(
            normalize_domain("http://yourhouse.example/"),
            "http://yourhouse.example"
        );
    }

    #[test]
    fn find_broker_is_case_insensitive() {
        let brokers = vec![broker_with_template("https://x/{area}")];
        assert!(find_broker(&brokers, "yourhouse").is_some());
        assert!(find_broker(&brokers, "YOURHOUSE").is_some());
        assert!(find_broker(&brokers, "other").is_none());
    }

    #[test]
    fn require_broker_reports_unknown_name_as_typed_error() {
        let brokers = vec![broker_with_template("https://x/{area}")];
        assert!(require_broker(&brokers, "yourhouse").is_ok());
        let result = require_broker(&brokers, "nonexistent");
        assert!(
            matches!(result, Err(ConfigError::BrokerNotFound(ref n)) if n == "nonexistent"),
            "expected BrokerNotFound, got: {result:?}"
        );
    }

    #[test]
    fn brokers_file_parses_full_entry() {
        let raw = r##"{
            "brokers": [{
                "name": "YourHouse",
                "domain": "yourhouse.example",
                "url": "https://yourhouse.example/rent/{area}?max={max_price}",
                "listing_selector": "div.listing-card",
                "next_button_selector": "a.next",
                "cookie_modal_selector": "#cookie-accept",
                "fetch_detail_pages": true
            }]
        }"##;
        let parsed: BrokersFile = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.brokers.len(), 1);
        let b = &parsed.brokers[0];
        assert_eq!(b.name, "YourHouse");
        assert!(b.fetch_detail_pages);
        assert_eq!(b.next_button_selector.as_deref(), Some("a.next"));
    }

    #[test]
    fn brokers_file_defaults_optional_fields() {
        let raw = r#"{
            "brokers": [{
                "name": "Minimal",
                "domain": "minimal.example",
                "url": "https://minimal.example/{area}",
                "listing_selector": ".card"
            }]
        }"#;
        let parsed: BrokersFile = serde_json::from_str(raw).unwrap();
        let b = &parsed.brokers[0];
        assert!(!b.fetch_detail_pages);
        assert!(b.next_button_selector.is_none());
        assert!(b.cookie_modal_selector.is_none());
    }
}
