//! File artifacts written during a scrape run.
//!
//! The output directory is append-only across runs; filenames carry a
//! timestamp so concurrent history never collides. Three artifact kinds:
//! the per-run property snapshot, the raw results page when discovery finds
//! nothing, and raw extraction text when JSON parsing fails.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use rentscout_core::PropertyRecord;

use crate::error::ScraperError;

fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Millisecond-resolution stamp for per-listing artifacts, which can be
/// produced several times within one second.
fn fine_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S_%3f").to_string()
}

/// Creates the output directory if it does not exist yet.
///
/// # Errors
///
/// Returns [`ScraperError::Io`] when the directory cannot be created.
pub fn ensure_output_dir(dir: &Path) -> Result<(), ScraperError> {
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Writes the extracted (non-error) records for one run to
/// `properties_<broker>_<area>_<timestamp>.json`.
///
/// # Errors
///
/// Returns [`ScraperError::Json`] if serialization fails and
/// [`ScraperError::Io`] on write failure.
pub fn save_properties_json(
    records: &[PropertyRecord],
    broker_name: &str,
    area: &str,
    dir: &Path,
) -> Result<PathBuf, ScraperError> {
    let path = dir.join(format!(
        "properties_{broker_name}_{area}_{}.json",
        timestamp()
    ));
    let body = serde_json::to_string_pretty(records).map_err(|e| ScraperError::Json {
        context: format!("property snapshot for {broker_name}"),
        source: e,
    })?;
    fs::write(&path, body)?;
    Ok(path)
}

/// Archives the full results-page body when the listing selector matched
/// nothing, so the operator can inspect the page structure.
///
/// # Errors
///
/// Returns [`ScraperError::Io`] on write failure.
pub fn save_debug_html(html: &str, dir: &Path) -> Result<PathBuf, ScraperError> {
    let path = dir.join(format!("debug_html_{}.html", timestamp()));
    fs::write(&path, html)?;
    Ok(path)
}

/// Archives raw extraction output that failed to parse as JSON.
///
/// # Errors
///
/// Returns [`ScraperError::Io`] on write failure.
pub fn save_raw_extraction(raw: &str, dir: &Path) -> Result<PathBuf, ScraperError> {
    let path = dir.join(format!("extraction_raw_{}.txt", fine_timestamp()));
    fs::write(&path, raw)?;
    Ok(path)
}
