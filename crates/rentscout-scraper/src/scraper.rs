//! Per-broker scrape orchestration.
//!
//! One `PropertyScraper` drives a single broker/area pass: fetch the results
//! page, discover listing fragments, process each listing strictly in
//! sequence (fetch detail → extract under the rate-limit policy → normalize),
//! then snapshot and persist the batch. Sequential ordering plus the
//! inter-listing delay is the backpressure mechanism against both the source
//! site and the extraction provider; there is no concurrent fan-out.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;

use rentscout_core::{AppConfig, BrokerConfig, PropertyRecord, ScrapingResult};

use crate::artifacts;
use crate::discover::{discover_listings, RawListing};
use crate::extract::{
    build_extraction_request, interpret_extraction, merge_extracted, ExtractionOutcome,
    ExtractionSettings,
};
use crate::fetch::PageClient;
use crate::gateway::PersistenceGateway;
use crate::llm::LlmClient;
use crate::normalize::{clean_url, ensure_full_url, normalize_property};
use crate::rate_limit::retry_rate_limited;
use crate::simplify::simplify_fragment;
use crate::ScraperError;

type SleepFn = Arc<dyn Fn(Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Result of one listing attempt. Failures are first-class entries so the
/// caller can see exactly which listings were lost and why.
#[derive(Debug)]
pub enum ListingOutcome {
    Extracted(PropertyRecord),
    Failed { message: String },
}

/// Everything a single broker run produced: per-listing outcomes plus the
/// run summary destined for the scraping report.
#[derive(Debug)]
pub struct ScrapeRun {
    pub outcomes: Vec<ListingOutcome>,
    pub summary: ScrapingResult,
}

pub struct PropertyScraper {
    broker: BrokerConfig,
    area: String,
    config: AppConfig,
    pages: PageClient,
    llm: LlmClient,
    gateway: PersistenceGateway,
    sleep: SleepFn,
}

impl PropertyScraper {
    /// Builds a scraper for one broker/area pair.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if an HTTP client cannot be constructed.
    pub fn new(
        broker: BrokerConfig,
        area: &str,
        config: &AppConfig,
    ) -> Result<Self, ScraperError> {
        let pages = PageClient::new(config.request_timeout_secs, &config.user_agent)?;
        let llm = LlmClient::new(&config.llm_base_url, &config.llm_api_key, &config.llm_model);
        let gateway = PersistenceGateway::new(&config.api_url, config.request_timeout_secs)?;
        Ok(Self {
            broker,
            area: area.to_string(),
            config: config.clone(),
            pages,
            llm,
            gateway,
            sleep: Arc::new(|wait| -> Pin<Box<dyn Future<Output = ()> + Send>> {
                Box::pin(tokio::time::sleep(wait))
            }),
        })
    }

    /// Replaces the inter-listing sleep, so pacing can be observed without
    /// real waiting.
    #[must_use]
    pub fn with_sleep<F, Fut>(mut self, sleep: F) -> Self
    where
        F: Fn(Duration) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.sleep = Arc::new(move |wait| -> Pin<Box<dyn Future<Output = ()> + Send>> {
            Box::pin(sleep(wait))
        });
        self
    }

    /// Runs one full scrape pass, processing at most `limit` listings.
    ///
    /// Page-fetch failure and an empty discovery are both valid terminal
    /// outcomes, not errors: the former is reported via the summary's
    /// `success`/`error_message`, the latter archives the page body for
    /// inspection. Per-listing failures become [`ListingOutcome::Failed`]
    /// entries and never abort the run.
    ///
    /// # Errors
    ///
    /// Returns an error only for local problems that make the run
    /// meaningless: an unwritable output directory or an invalid
    /// `listing_selector`.
    pub async fn scrape(&self, limit: usize) -> Result<ScrapeRun, ScraperError> {
        let started = Instant::now();
        let mut summary = ScrapingResult::new(&self.broker.name);

        let url = self.broker.url_for_area(&self.area);
        artifacts::ensure_output_dir(&self.config.output_dir)?;
        tracing::info!(broker = %self.broker.name, url = %url, "starting scrape");

        let page = match self.pages.fetch(&url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(broker = %self.broker.name, error = %e, "results page fetch failed");
                summary.error_message = e.to_string();
                summary.time_taken_secs = started.elapsed().as_secs_f64();
                return Ok(ScrapeRun {
                    outcomes: Vec::new(),
                    summary,
                });
            }
        };

        let listings = discover_listings(&page, &self.broker.listing_selector)?;
        tracing::info!(
            found = listings.len(),
            selector = %self.broker.listing_selector,
            "discovered listings"
        );

        if listings.is_empty() {
            let debug_file = artifacts::save_debug_html(&page, &self.config.output_dir)?;
            tracing::warn!(
                broker = %self.broker.name,
                debug_file = %debug_file.display(),
                "no listings matched the selector; archived page body"
            );
            summary.success = true;
            summary.time_taken_secs = started.elapsed().as_secs_f64();
            return Ok(ScrapeRun {
                outcomes: Vec::new(),
                summary,
            });
        }

        let count = listings.len().min(limit);
        let settings = ExtractionSettings {
            chunk_token_threshold: self.config.chunk_token_threshold,
            chunk_overlap_rate: self.config.chunk_overlap_rate,
            temperature: self.config.llm_temperature,
            max_tokens: self.config.llm_max_tokens,
        };

        let mut outcomes = Vec::with_capacity(count);
        for (index, listing) in listings.into_iter().take(count).enumerate() {
            if index > 0 {
                self.inter_listing_delay().await;
            }
            tracing::info!(listing = index + 1, total = count, "processing listing");
            let outcome = self.process_listing(&listing, &settings).await;
            if let ListingOutcome::Failed { ref message } = outcome {
                tracing::warn!(listing = index + 1, message = %message, "listing extraction failed");
            }
            outcomes.push(outcome);
        }

        let records: Vec<PropertyRecord> = outcomes
            .iter()
            .filter_map(|o| match o {
                ListingOutcome::Extracted(record) => Some(record.clone()),
                ListingOutcome::Failed { .. } => None,
            })
            .collect();
        summary.properties_found = records.len();

        if !records.is_empty() {
            let snapshot = artifacts::save_properties_json(
                &records,
                &self.broker.name,
                &self.area,
                &self.config.output_dir,
            )?;
            tracing::info!(snapshot = %snapshot.display(), "wrote property snapshot");
            summary.properties_saved = self.gateway.save_all(&records).await;
        }

        summary.success = true;
        summary.time_taken_secs = started.elapsed().as_secs_f64();
        tracing::info!(
            broker = %self.broker.name,
            found = summary.properties_found,
            saved = summary.properties_saved,
            elapsed_secs = summary.time_taken_secs,
            "scrape finished"
        );

        Ok(ScrapeRun { outcomes, summary })
    }

    /// Processes a single discovered listing into an outcome.
    ///
    /// The detail-page fetch is best-effort augmentation: on failure the
    /// extraction proceeds with the listing fragment alone. Each content
    /// chunk runs under the bounded rate-limit retry; partial objects from
    /// multiple chunks are merged field-wise.
    async fn process_listing(
        &self,
        listing: &RawListing,
        settings: &ExtractionSettings,
    ) -> ListingOutcome {
        let detail_url = if listing.listing_url.is_empty() {
            String::new()
        } else {
            ensure_full_url(&self.broker.domain, &clean_url(&listing.listing_url))
        };

        // Reduce markup noise before it reaches the provider, keeping token
        // usage (and with it the rate-limit exposure) down.
        let mut content = simplify_fragment(&listing.html_content);
        if self.broker.fetch_detail_pages && !detail_url.is_empty() {
            match self.pages.fetch(&detail_url).await {
                Ok(detail) => {
                    content.push_str("\n\n");
                    content.push_str(&simplify_fragment(&detail));
                }
                Err(e) => {
                    tracing::warn!(
                        url = %detail_url,
                        error = %e,
                        "detail page fetch failed; extracting from listing fragment only"
                    );
                }
            }
        }

        let request = build_extraction_request(&self.broker.domain, &content, settings);

        let mut partials = Vec::new();
        let mut parse_failure = false;
        let mut provider_failure: Option<String> = None;

        for chunk in &request.chunks {
            let result = retry_rate_limited(
                self.config.extraction_max_attempts,
                self.config.rate_limit_default_wait_secs,
                || {
                    self.llm.extract(
                        &request.instruction,
                        chunk,
                        request.temperature,
                        request.max_tokens,
                    )
                },
            )
            .await;

            match interpret_extraction(result) {
                ExtractionOutcome::Success(map) => partials.push(map),
                ExtractionOutcome::EmptyList => {}
                ExtractionOutcome::ParseError { raw } => {
                    parse_failure = true;
                    match artifacts::save_raw_extraction(&raw, &self.config.output_dir) {
                        Ok(path) => {
                            tracing::warn!(
                                artifact = %path.display(),
                                "extraction output was not JSON; archived raw text"
                            );
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to archive raw extraction output");
                        }
                    }
                }
                ExtractionOutcome::ProviderError { message } => {
                    provider_failure = Some(message);
                    break;
                }
            }
        }

        if !partials.is_empty() {
            let merged = merge_extracted(partials);
            return ListingOutcome::Extracted(normalize_property(
                &merged,
                &detail_url,
                &self.broker,
            ));
        }

        let message = if let Some(message) = provider_failure {
            message
        } else if parse_failure {
            "JSON parsing error".to_string()
        } else {
            "LLM returned empty list".to_string()
        };
        ListingOutcome::Failed { message }
    }

    /// Politeness delay between consecutive listings: the configured base
    /// plus up to 25% random jitter. A zero base skips the sleep entirely.
    async fn inter_listing_delay(&self) {
        let base = self.config.inter_listing_delay_secs;
        if base == 0 {
            return;
        }
        #[allow(clippy::cast_precision_loss)]
        let jitter = rand::rng().random_range(0.0..=(base as f64 * 0.25));
        #[allow(clippy::cast_precision_loss)]
        let wait = Duration::from_secs_f64(base as f64 + jitter);
        tracing::debug!(wait_secs = wait.as_secs_f64(), "inter-listing delay");
        (self.sleep)(wait).await;
    }
}
