mod report;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rentscout_core::{load_app_config, load_brokers, require_broker, ScrapingResult};
use rentscout_scraper::PropertyScraper;

#[derive(Debug, Parser)]
#[command(name = "rentscout")]
#[command(about = "Scrape rental listings from configured broker sites")]
struct Cli {
    /// Area to search; falls back to RENTSCOUT_AREA.
    #[arg(long)]
    area: Option<String>,

    /// Broker name to scrape, or "all" for every configured broker.
    #[arg(long, default_value = "all")]
    broker: String,

    /// Maximum rent substituted into broker URL templates.
    #[arg(long, default_value_t = 2000)]
    max_price: u32,

    /// Maximum listings to process per broker.
    #[arg(long, default_value_t = 5)]
    limit: usize,

    /// Verbose logging regardless of RENTSCOUT_LOG_LEVEL.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = load_app_config()?;
    let default_level = if cli.debug {
        "debug".to_string()
    } else {
        config.log_level.clone()
    };
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let area = cli.area.unwrap_or_else(|| config.default_area.clone());
    let mut brokers = load_brokers(&config.brokers_path)?;
    for broker in &mut brokers {
        broker.apply_max_price(cli.max_price);
    }

    let selected = if cli.broker.eq_ignore_ascii_case("all") {
        brokers
    } else {
        let broker = require_broker(&brokers, &cli.broker)?;
        vec![broker.clone()]
    };

    tracing::info!(
        brokers = selected.len(),
        area = %area,
        limit = cli.limit,
        "starting scrape run"
    );

    let mut results: Vec<ScrapingResult> = Vec::with_capacity(selected.len());
    let total = selected.len();
    for (index, broker) in selected.into_iter().enumerate() {
        if index > 0 && config.inter_broker_cooldown_secs > 0 {
            tracing::info!(
                cooldown_secs = config.inter_broker_cooldown_secs,
                "cooling down before next broker"
            );
            tokio::time::sleep(Duration::from_secs(config.inter_broker_cooldown_secs)).await;
        }
        tracing::info!(broker = %broker.name, position = index + 1, total, "scraping broker");

        let name = broker.name.clone();
        match PropertyScraper::new(broker, &area, &config) {
            Ok(scraper) => match scraper.scrape(cli.limit).await {
                Ok(run) => results.push(run.summary),
                Err(e) => {
                    tracing::error!(broker = %name, error = %e, "scrape aborted");
                    let mut summary = ScrapingResult::new(&name);
                    summary.error_message = e.to_string();
                    results.push(summary);
                }
            },
            Err(e) => {
                tracing::error!(broker = %name, error = %e, "failed to build scraper");
                let mut summary = ScrapingResult::new(&name);
                summary.error_message = e.to_string();
                results.push(summary);
            }
        }
    }

    std::fs::create_dir_all(&config.output_dir)?;
    let report_path = report::write_report(&results, &config.output_dir)?;
    println!("{}", report::format_report(&results));
    println!("Report written to {}", report_path.display());

    Ok(())
}
