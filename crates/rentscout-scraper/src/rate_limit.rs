//! Rate-limit detection and bounded retry for LLM extraction calls.
//!
//! The provider signals throttling inside free-text error bodies, so
//! detection is a case-insensitive substring match and the suggested wait is
//! parsed from a `try again in <seconds>s` pattern. Only rate-limit errors
//! are retried; every other failure propagates immediately. Page fetches are
//! never routed through this module.

use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::error::ScraperError;

fn wait_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"try again in (\d+\.?\d*)s").expect("wait pattern regex"))
}

/// Returns `true` when the provider error text indicates throttling.
#[must_use]
pub fn is_rate_limited(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("rate limit") || lower.contains("ratelimit")
}

/// Parses the provider-suggested wait from an error message, falling back to
/// `default_wait_secs` when the message carries no usable duration.
#[must_use]
pub fn rate_limit_wait(message: &str, default_wait_secs: u64) -> Duration {
    let lower = message.to_lowercase();
    wait_pattern()
        .captures(&lower)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map_or(Duration::from_secs(default_wait_secs), |secs| {
            Duration::from_secs_f64(secs)
        })
}

/// Wait hint for a [`ScraperError`]: `Some` only for provider errors whose
/// message indicates rate limiting.
fn wait_hint(err: &ScraperError, default_wait_secs: u64) -> Option<Duration> {
    match err {
        ScraperError::Provider { message } if is_rate_limited(message) => {
            Some(rate_limit_wait(message, default_wait_secs))
        }
        _ => None,
    }
}

/// Executes `operation` up to `max_attempts` times, sleeping between attempts
/// that fail with a rate-limit error.
///
/// On success the result is returned immediately. A rate-limited failure
/// sleeps for the provider-suggested (or default) wait and tries again; once
/// `max_attempts` is reached the final rate-limit error is returned. Any
/// non-rate-limit error is returned without retrying.
pub async fn retry_rate_limited<T, F, Fut>(
    max_attempts: u32,
    default_wait_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let Some(wait) = wait_hint(&err, default_wait_secs) else {
                    return Err(err);
                };
                if attempt >= max_attempts {
                    tracing::warn!(attempt, max_attempts, "rate-limit retries exhausted");
                    return Err(err);
                }
                tracing::warn!(
                    attempt,
                    max_attempts,
                    wait_secs = wait.as_secs_f64(),
                    error = %err,
                    "extraction rate limited, waiting before retry"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
        }
    }
}
