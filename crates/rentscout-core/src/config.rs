use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files, useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup, no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let llm_api_key = require("RENTSCOUT_LLM_API_KEY")?;

    let llm_base_url = or_default("RENTSCOUT_LLM_BASE_URL", "https://api.groq.com/openai/v1");
    let llm_model = or_default("RENTSCOUT_LLM_MODEL", "llama-3.1-8b-instant");
    let llm_temperature = parse_f64("RENTSCOUT_LLM_TEMPERATURE", "0.1")?;
    let llm_max_tokens = parse_u32("RENTSCOUT_LLM_MAX_TOKENS", "2000")?;
    let chunk_token_threshold = parse_usize("RENTSCOUT_CHUNK_TOKEN_THRESHOLD", "800")?;
    let chunk_overlap_rate = parse_f64("RENTSCOUT_CHUNK_OVERLAP_RATE", "0.05")?;
    let extraction_max_attempts = parse_u32("RENTSCOUT_EXTRACTION_MAX_ATTEMPTS", "3")?;
    let rate_limit_default_wait_secs = parse_u64("RENTSCOUT_RATE_LIMIT_DEFAULT_WAIT_SECS", "30")?;

    let api_url = or_default("RENTSCOUT_API_URL", "http://localhost:8000");
    let output_dir = PathBuf::from(or_default("RENTSCOUT_OUTPUT_DIR", "output"));
    let brokers_path = PathBuf::from(or_default(
        "RENTSCOUT_BROKERS_PATH",
        "./config/brokers.json",
    ));

    let request_timeout_secs = parse_u64("RENTSCOUT_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default(
        "RENTSCOUT_USER_AGENT",
        "rentscout/0.1 (rental-market-snapshots)",
    );
    let inter_listing_delay_secs = parse_u64("RENTSCOUT_INTER_LISTING_DELAY_SECS", "20")?;
    let inter_broker_cooldown_secs = parse_u64("RENTSCOUT_INTER_BROKER_COOLDOWN_SECS", "30")?;

    let log_level = or_default("RENTSCOUT_LOG_LEVEL", "info");
    let default_area = or_default("RENTSCOUT_AREA", "utrecht");

    Ok(AppConfig {
        llm_api_key,
        llm_base_url,
        llm_model,
        llm_temperature,
        llm_max_tokens,
        chunk_token_threshold,
        chunk_overlap_rate,
        extraction_max_attempts,
        rate_limit_default_wait_secs,
        api_url,
        output_dir,
        brokers_path,
        request_timeout_secs,
        user_agent,
        inter_listing_delay_secs,
        inter_broker_cooldown_secs,
        log_level,
        default_area,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    /// Returns a map with all required env vars populated with valid values.
    fn full_env<'a>() -> HashMap<&'a str, &'a str> {
        let mut m = HashMap::new();
        m.insert("RENTSCOUT_LLM_API_KEY", "test-key");
        m
    }

    #[test]
    fn build_app_config_fails_without_llm_api_key() {
        let map: HashMap<&str, &str> = HashMap::new();
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "RENTSCOUT_LLM_API_KEY"),
            "expected MissingEnvVar(RENTSCOUT_LLM_API_KEY), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_succeeds_with_defaults() {
        let map = full_env();
        let result = build_app_config(lookup_from_map(&map));
        assert!(result.is_ok(), "expected Ok, got: {result:?}");
        let cfg = result.unwrap();
        assert_eq!(cfg.llm_base_url, "https://api.groq.com/openai/v1");
        assert_eq!(cfg.llm_model, "llama-3.1-8b-instant");
        assert!((cfg.llm_temperature - 0.1).abs() < f64::EPSILON);
        assert_eq!(cfg.llm_max_tokens, 2000);
        assert_eq!(cfg.chunk_token_threshold, 800);
        assert!((cfg.chunk_overlap_rate - 0.05).abs() < f64::EPSILON);
        assert_eq!(cfg.extraction_max_attempts, 3);
        assert_eq!(cfg.rate_limit_default_wait_secs, 30);
        assert_eq!(cfg.api_url, "http://localhost:8000");
        assert_eq!(cfg.output_dir.to_string_lossy(), "output");
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.inter_listing_delay_secs, 20);
        assert_eq!(cfg.inter_broker_cooldown_secs, 30);
        assert_eq!(cfg.default_area, "utrecht");
    }

    #[test]
    fn build_app_config_temperature_override() {
        let mut map = full_env();
        map.insert("RENTSCOUT_LLM_TEMPERATURE", "0.0");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.llm_temperature.abs() < f64::EPSILON);
    }

    #[test]
    fn build_app_config_temperature_invalid() {
        let mut map = full_env();
        map.insert("RENTSCOUT_LLM_TEMPERATURE", "warm");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "RENTSCOUT_LLM_TEMPERATURE"),
            "expected InvalidEnvVar(RENTSCOUT_LLM_TEMPERATURE), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_max_attempts_override() {
        let mut map = full_env();
        map.insert("RENTSCOUT_EXTRACTION_MAX_ATTEMPTS", "5");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.extraction_max_attempts, 5);
    }

    #[test]
    fn build_app_config_max_attempts_invalid() {
        let mut map = full_env();
        map.insert("RENTSCOUT_EXTRACTION_MAX_ATTEMPTS", "many");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "RENTSCOUT_EXTRACTION_MAX_ATTEMPTS"),
            "expected InvalidEnvVar(RENTSCOUT_EXTRACTION_MAX_ATTEMPTS), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_inter_listing_delay_override() {
        let mut map = full_env();
        map.insert("RENTSCOUT_INTER_LISTING_DELAY_SECS", "0");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.inter_listing_delay_secs, 0);
    }

    #[test]
    fn build_app_config_api_url_override() {
        let mut map = full_env();
        map.insert("RENTSCOUT_API_URL", "http://api.internal:9000");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.api_url, "http://api.internal:9000");
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let map = full_env();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("test-key"), "API key leaked: {rendered}");
        assert!(rendered.contains("[redacted]"));
    }
}
