//! Extraction request construction and result interpretation.
//!
//! The request side turns a listing fragment into one or more content chunks
//! plus a field-by-field instruction; the interpretation side collapses the
//! provider's untyped output (object, array, malformed text, or outright
//! failure) into a tagged [`ExtractionOutcome`] the orchestrator can match on.

use serde_json::{json, Map, Value};

use crate::error::ScraperError;

/// Rough character budget per provider token, used for client-side chunking.
const APPROX_CHARS_PER_TOKEN: usize = 4;

/// Target field set with the literal representation the extractor must use.
/// All fields are extracted as strings; coercion happens in normalization.
const FIELD_INSTRUCTIONS: &[(&str, &str)] = &[
    ("address", "the property street address"),
    ("price", "monthly rent, number only"),
    ("area", "surface in square meters, number only"),
    ("bedrooms", "number only"),
    ("energy_label", "a letter A-G (A++ and A+ allowed)"),
    ("furnished", "the literal string 'true' or 'false'"),
    ("including_bills", "the literal string 'true' or 'false'"),
    ("status", "one of 'available', 'rented', 'option'"),
    ("available_from", "date as YYYY-MM-DD"),
    ("url", "the listing URL"),
];

/// A fully prepared extraction call: instruction, string-typed target schema,
/// pre-chunked content, and generation parameters.
#[derive(Debug)]
pub struct ExtractionRequest {
    pub instruction: String,
    pub schema: Value,
    pub chunks: Vec<String>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Tuning knobs for request construction, taken from `AppConfig`.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionSettings {
    pub chunk_token_threshold: usize,
    pub chunk_overlap_rate: f64,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Builds the extraction request for one listing fragment.
///
/// The instruction names every target field with its expected literal
/// representation and explicitly demands a single JSON object; array
/// responses are a known failure mode handled in [`interpret_extraction`].
#[must_use]
pub fn build_extraction_request(
    domain: &str,
    fragment: &str,
    settings: &ExtractionSettings,
) -> ExtractionRequest {
    let mut instruction = String::from(
        "You extract rental property data from HTML fragments. \
         Extract these fields:\n",
    );
    for (field, description) in FIELD_INSTRUCTIONS {
        instruction.push_str(&format!("- {field}: {description}\n"));
    }
    instruction.push_str(&format!(
        "\nRelative URLs belong to {domain}. \
         Use an empty string for fields that are not present. \
         Return a single JSON object, not an array, with no surrounding text."
    ));

    let schema = json!({
        "type": "object",
        "properties": FIELD_INSTRUCTIONS
            .iter()
            .map(|(field, _)| ((*field).to_string(), json!({"type": "string"})))
            .collect::<serde_json::Map<String, Value>>(),
    });

    ExtractionRequest {
        instruction,
        schema,
        chunks: chunk_content(
            fragment,
            settings.chunk_token_threshold,
            settings.chunk_overlap_rate,
        ),
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
    }
}

/// Splits content into approx-token-sized chunks with overlap between
/// consecutive chunks, so a field straddling a boundary still appears whole
/// in one of them. Content within the budget stays a single chunk.
fn chunk_content(content: &str, max_tokens: usize, overlap_rate: f64) -> Vec<String> {
    let chunk_chars = max_tokens.saturating_mul(APPROX_CHARS_PER_TOKEN).max(1);
    let chars: Vec<char> = content.chars().collect();
    if chars.len() <= chunk_chars {
        return vec![content.to_string()];
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let overlap = ((chunk_chars as f64) * overlap_rate.clamp(0.0, 0.9)) as usize;
    let step = chunk_chars.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0usize;
    loop {
        let end = (start + chunk_chars).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

/// Tagged interpretation of one extraction response.
#[derive(Debug)]
pub enum ExtractionOutcome {
    /// A parsed JSON object (or the first element of a non-empty array).
    Success(Map<String, Value>),
    /// The provider answered with an empty array.
    EmptyList,
    /// The response text was not parseable JSON; `raw` should be archived.
    ParseError { raw: String },
    /// Transport/provider failure, including exhausted rate-limit retries.
    ProviderError { message: String },
}

/// Collapses a provider call result into an [`ExtractionOutcome`].
///
/// Array responses are a known failure mode of the extractor despite the
/// single-object instruction: a non-empty array collapses to its first
/// element, an empty one is reported as such. Nothing here ever panics or
/// raises past the caller.
#[must_use]
pub fn interpret_extraction(result: Result<String, ScraperError>) -> ExtractionOutcome {
    let text = match result {
        Ok(text) => text,
        Err(err) => {
            return ExtractionOutcome::ProviderError {
                message: err.to_string(),
            }
        }
    };

    let parsed: Value = match serde_json::from_str(text.trim()) {
        Ok(value) => value,
        Err(_) => return ExtractionOutcome::ParseError { raw: text },
    };

    match parsed {
        Value::Object(map) => ExtractionOutcome::Success(map),
        Value::Array(items) => match items.into_iter().next() {
            Some(Value::Object(map)) => ExtractionOutcome::Success(map),
            Some(_) => ExtractionOutcome::ParseError { raw: text },
            None => ExtractionOutcome::EmptyList,
        },
        _ => ExtractionOutcome::ParseError { raw: text },
    }
}

/// Merges per-chunk partial objects field-wise: the first non-empty value
/// for each field wins, preserving chunk order.
#[must_use]
pub fn merge_extracted(partials: Vec<Map<String, Value>>) -> Map<String, Value> {
    let mut merged = Map::new();
    for partial in partials {
        for (key, value) in partial {
            let is_empty = matches!(&value, Value::String(s) if s.is_empty()) || value.is_null();
            if is_empty {
                continue;
            }
            merged.entry(key).or_insert(value);
        }
    }
    merged
}
