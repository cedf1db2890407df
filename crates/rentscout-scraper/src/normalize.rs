//! Normalization from raw extracted fields to [`PropertyRecord`].
//!
//! Every function here is pure and total: malformed input maps to an empty
//! string (or the enum default), never to an error. Missing required fields
//! are logged as warnings but the record is still forwarded; tightening
//! that silently changes stored data volume.

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use rentscout_core::{BrokerConfig, PropertyRecord};

const ENERGY_LABELS: &[&str] = &["A++", "A+", "A", "B", "C", "D", "E", "F", "G"];
const STATUSES: &[&str] = &["available", "rented", "option"];

/// Returns the first run of ASCII digits found anywhere in `raw`, else empty.
///
/// `"€1,250 per month"` → `"1250"` is handled by treating `,` and `.` inside
/// a digit run as thousands separators.
fn first_digit_run(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let mut digits = String::new();
            while i < bytes.len() {
                let b = bytes[i];
                if b.is_ascii_digit() {
                    digits.push(b as char);
                    i += 1;
                } else if (b == b',' || b == b'.')
                    && i + 1 < bytes.len()
                    && bytes[i + 1].is_ascii_digit()
                {
                    // Separator inside the run: skip it, keep consuming digits.
                    i += 1;
                } else {
                    break;
                }
            }
            return digits;
        }
        i += 1;
    }
    String::new()
}

/// Digits-only monthly rent.
#[must_use]
pub fn clean_price(raw: &str) -> String {
    first_digit_run(raw)
}

/// Digits-only surface area.
#[must_use]
pub fn clean_area(raw: &str) -> String {
    first_digit_run(raw)
}

/// Digits-only bedroom count.
#[must_use]
pub fn clean_bedrooms(raw: &str) -> String {
    first_digit_run(raw)
}

/// Uppercased energy label when valid (`A++`, `A+`, `A`..`G`), else empty.
#[must_use]
pub fn clean_energy_label(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    if ENERGY_LABELS.contains(&upper.as_str()) {
        upper
    } else {
        String::new()
    }
}

/// Coerces `true`/`yes`/`1`/`y` (any case) to `true`; everything else,
/// including absence, is `false`.
#[must_use]
pub fn clean_boolean(raw: Option<&str>) -> bool {
    match raw {
        Some(value) => matches!(
            value.trim().to_lowercase().as_str(),
            "true" | "yes" | "1" | "y"
        ),
        None => false,
    }
}

/// Lowercased status when recognized (`available`/`rented`/`option`),
/// defaulting to `available` otherwise.
#[must_use]
pub fn clean_status(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    if STATUSES.contains(&lower.as_str()) {
        lower
    } else {
        "available".to_string()
    }
}

/// Strict `YYYY-MM-DD` validation; anything else yields empty.
#[must_use]
pub fn clean_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok() {
        trimmed.to_string()
    } else {
        String::new()
    }
}

fn markdown_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(.*?)\]\((.*?)\)").expect("markdown link regex"))
}

/// Strips angle brackets and surrounding quotes from a URL and unwraps
/// markdown link syntax: `[here](http://x.com/a)` → `http://x.com/a`.
///
/// Extractors occasionally echo URLs back wrapped in the formatting they saw.
#[must_use]
pub fn clean_url(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut url = raw.replace(['<', '>'], "");
    url = url
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string();

    if let Some(captures) = markdown_link_re().captures(&url) {
        if let Some(target) = captures.get(2) {
            url = target.as_str().to_string();
        }
    }

    url
}

/// Qualifies a possibly-relative URL against the broker's base origin.
/// Absolute input is returned unchanged; empty input stays empty.
#[must_use]
pub fn ensure_full_url(base: &str, url: &str) -> String {
    if url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        url.trim_start_matches('/')
    )
}

/// Reads a field from the untyped extraction object as a string.
///
/// The extractor is instructed to return string-typed fields, but numbers
/// and booleans show up anyway; coerce rather than reject.
fn field_str(raw: &Map<String, Value>, key: &str) -> String {
    field_opt(raw, key).unwrap_or_default()
}

/// Like [`field_str`] but distinguishes an absent field from an empty one.
fn field_opt(raw: &Map<String, Value>, key: &str) -> Option<String> {
    match raw.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}

/// Assembles a [`PropertyRecord`] from the untyped extraction output.
///
/// The discovered detail URL takes precedence over any URL the extractor
/// produced; both go through [`clean_url`] and [`ensure_full_url`]. The
/// broker name is stamped here, never left to extraction. Records with empty
/// `address`, `price`, or `url` are logged as warnings but still returned.
#[must_use]
pub fn normalize_property(
    raw: &Map<String, Value>,
    listing_url: &str,
    broker: &BrokerConfig,
) -> PropertyRecord {
    let extracted_url = field_str(raw, "url");
    let preferred = if listing_url.is_empty() {
        extracted_url
    } else {
        listing_url.to_string()
    };
    let url = ensure_full_url(&broker.domain, &clean_url(&preferred));

    let record = PropertyRecord {
        address: field_str(raw, "address").trim().to_string(),
        price: clean_price(&field_str(raw, "price")),
        area: clean_area(&field_str(raw, "area")),
        bedrooms: clean_bedrooms(&field_str(raw, "bedrooms")),
        energy_label: clean_energy_label(&field_str(raw, "energy_label")),
        furnished: clean_boolean(field_opt(raw, "furnished").as_deref()),
        including_bills: clean_boolean(field_opt(raw, "including_bills").as_deref()),
        status: clean_status(&field_str(raw, "status")),
        available_from: clean_date(&field_str(raw, "available_from")),
        url,
        broker: broker.name.clone(),
    };

    for (field, value) in [
        ("address", record.address.as_str()),
        ("price", record.price.as_str()),
        ("url", record.url.as_str()),
    ] {
        if value.is_empty() {
            tracing::warn!(
                broker = %broker.name,
                field,
                "normalized record is missing a required field; forwarding anyway"
            );
        }
    }

    record
}
