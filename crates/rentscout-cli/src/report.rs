//! Plain-text run report written next to the property snapshots.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use rentscout_core::ScrapingResult;

/// Renders the per-broker blocks plus a totals footer.
pub fn format_report(results: &[ScrapingResult]) -> String {
    let mut out = String::new();
    out.push_str("RENTSCOUT SCRAPING REPORT\n");
    out.push_str(&format!(
        "Generated: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str("=========================\n\n");

    for result in results {
        out.push_str(&format!("Broker: {}\n", result.broker_name));
        out.push_str(&format!(
            "Status: {}\n",
            if result.success { "OK" } else { "FAILED" }
        ));
        if !result.error_message.is_empty() {
            out.push_str(&format!("Error: {}\n", result.error_message));
        }
        out.push_str(&format!("Properties found: {}\n", result.properties_found));
        out.push_str(&format!("Properties saved: {}\n", result.properties_saved));
        out.push_str(&format!("Time taken: {:.1}s\n\n", result.time_taken_secs));
    }

    let found: usize = results.iter().map(|r| r.properties_found).sum();
    let saved: usize = results.iter().map(|r| r.properties_saved).sum();
    let failed = results.iter().filter(|r| !r.success).count();
    out.push_str("-------------------------\n");
    out.push_str(&format!(
        "Brokers: {} ({} failed)\n",
        results.len(),
        failed
    ));
    out.push_str(&format!("Total found: {found}\n"));
    out.push_str(&format!("Total saved: {saved}\n"));
    out
}

/// Writes the report to `scraping_report_<timestamp>.txt` in `dir`.
pub fn write_report(results: &[ScrapingResult], dir: &Path) -> std::io::Result<PathBuf> {
    let path = dir.join(format!(
        "scraping_report_{}.txt",
        Local::now().format("%Y%m%d_%H%M%S")
    ));
    fs::write(&path, format_report(results))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_report_covers_success_and_failure() {
        let mut ok = ScrapingResult::new("YourHouse");
        ok.success = true;
        ok.properties_found = 4;
        ok.properties_saved = 3;
        ok.time_taken_secs = 12.5;

        let mut bad = ScrapingResult::new("BrokenBroker");
        bad.error_message = "unexpected HTTP status 503".to_string();
        bad.time_taken_secs = 1.0;

        let report = format_report(&[ok, bad]);
        assert!(report.contains("Broker: YourHouse"));
        assert!(report.contains("Status: OK"));
        assert!(report.contains("Properties found: 4"));
        assert!(report.contains("Broker: BrokenBroker"));
        assert!(report.contains("Status: FAILED"));
        assert!(report.contains("Error: unexpected HTTP status 503"));
        assert!(report.contains("Brokers: 2 (1 failed)"));
        assert!(report.contains("Total found: 4"));
        assert!(report.contains("Total saved: 3"));
    }

    #[test]
    fn write_report_creates_timestamped_file() {
        let dir = std::env::temp_dir().join(format!("rentscout-report-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let path = write_report(&[ScrapingResult::new("YourHouse")], &dir).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("scraping_report_"));
        assert!(name.ends_with(".txt"));
        assert!(fs::read_to_string(&path).unwrap().contains("YourHouse"));

        fs::remove_dir_all(&dir).ok();
    }
}
