//! Persistence gateway: forwards normalized records to the CRUD API.
//!
//! Records are posted one at a time; the server upserts by `url`, so
//! re-sending is idempotent. One record's failure never blocks its siblings:
//! failures are logged and counted, not propagated.

use std::time::Duration;

use reqwest::Client;

use rentscout_core::PropertyRecord;

use crate::error::ScraperError;

pub struct PersistenceGateway {
    http: Client,
    api_url: String,
}

impl PersistenceGateway {
    /// Creates a gateway for the CRUD API at `api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_url: &str, timeout_secs: u64) -> Result<Self, ScraperError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Saves each record individually and independently; returns how many
    /// were accepted by the API.
    pub async fn save_all(&self, records: &[PropertyRecord]) -> usize {
        let mut saved = 0usize;
        for record in records {
            match self.save_one(record).await {
                Ok(()) => {
                    tracing::info!(address = %record.address, url = %record.url, "saved property");
                    saved += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        url = %record.url,
                        error = %e,
                        "failed to save property; continuing with remaining records"
                    );
                }
            }
        }
        saved
    }

    async fn save_one(&self, record: &PropertyRecord) -> Result<(), ScraperError> {
        let url = format!("{}/properties/", self.api_url);
        let response = self.http.post(&url).json(record).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::Fetch {
                url,
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
