use std::path::PathBuf;

/// Process-wide configuration, built once at startup and passed by reference
/// into the scraper. No component reads the environment after this point.
#[derive(Clone)]
pub struct AppConfig {
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_temperature: f64,
    pub llm_max_tokens: u32,
    pub chunk_token_threshold: usize,
    pub chunk_overlap_rate: f64,
    pub extraction_max_attempts: u32,
    pub rate_limit_default_wait_secs: u64,
    pub api_url: String,
    pub output_dir: PathBuf,
    pub brokers_path: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub inter_listing_delay_secs: u64,
    pub inter_broker_cooldown_secs: u64,
    pub log_level: String,
    pub default_area: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("llm_api_key", &"[redacted]")
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_model", &self.llm_model)
            .field("llm_temperature", &self.llm_temperature)
            .field("llm_max_tokens", &self.llm_max_tokens)
            .field("chunk_token_threshold", &self.chunk_token_threshold)
            .field("chunk_overlap_rate", &self.chunk_overlap_rate)
            .field("extraction_max_attempts", &self.extraction_max_attempts)
            .field(
                "rate_limit_default_wait_secs",
                &self.rate_limit_default_wait_secs,
            )
            .field("api_url", &self.api_url)
            .field("output_dir", &self.output_dir)
            .field("brokers_path", &self.brokers_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("inter_listing_delay_secs", &self.inter_listing_delay_secs)
            .field(
                "inter_broker_cooldown_secs",
                &self.inter_broker_cooldown_secs,
            )
            .field("log_level", &self.log_level)
            .field("default_area", &self.default_area)
            .finish()
    }
}
