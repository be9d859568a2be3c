//! Retry policy with exponential backoff and jitter.
//!
//! - Exponential backoff with full jitter, never below the base delay
//! - `Retry-After` on 429 replaces the computed delay
//! - Only transient failures are retried (see [`FeedError::is_retryable`])

use std::future::Future;
use std::time::Duration;

use tracing::{info_span, warn, Instrument};

use crate::error::{FeedError, FeedResult};
use crate::metrics::record_retry;

// =============================================================================
// Configuration
// =============================================================================

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first try.
    pub max_retries: u32,
    /// Base delay for exponential backoff (in milliseconds).
    pub base_delay_ms: u64,
    /// Maximum delay cap (in milliseconds).
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 250,
            max_delay_ms: 5000,
        }
    }
}

impl RetryConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: env_parse("FEED_RETRY_MAX", defaults.max_retries),
            base_delay_ms: env_parse("FEED_RETRY_BASE_MS", defaults.base_delay_ms),
            max_delay_ms: env_parse("FEED_RETRY_MAX_MS", defaults.max_delay_ms),
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

// =============================================================================
// Retry Policy
// =============================================================================

/// Execute an async operation with retry.
///
/// Retries network errors, HTTP 429 (honoring `Retry-After`) and HTTP 5xx.
/// Auth failures and other 4xx responses are returned immediately.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: &str, op: F) -> FeedResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = FeedResult<T>>,
{
    let mut last_error = None;

    for attempt in 0..=config.max_retries {
        let span = info_span!("feed_retry", operation = %operation, attempt = attempt + 1);

        match op().instrument(span).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                let delay = calculate_delay(config, attempt, e.retry_after_ms());

                warn!(
                    operation = %operation,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Feed request failed, retrying: {}",
                    e
                );

                record_retry(operation);
                tokio::time::sleep(delay).await;
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or_else(|| FeedError::request_failed("Unknown error")))
}

/// Calculate retry delay with exponential backoff and full jitter.
fn calculate_delay(config: &RetryConfig, attempt: u32, retry_after_ms: Option<u64>) -> Duration {
    if let Some(after) = retry_after_ms {
        return Duration::from_millis(after);
    }

    let exp_delay = config
        .base_delay_ms
        .saturating_mul(2u64.saturating_pow(attempt));
    let capped_delay = exp_delay.min(config.max_delay_ms);

    // Time-based jitter keeps the dependency set small
    let jittered = if capped_delay > 0 {
        use std::time::SystemTime;
        let nanos = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        let random_factor = (nanos % 1000) as f64 / 1000.0;
        ((capped_delay as f64) * random_factor) as u64
    } else {
        0
    };

    Duration::from_millis(jittered.max(config.base_delay_ms.min(config.max_delay_ms)))
}

/// Parse a `Retry-After` header given in seconds.
pub fn parse_retry_after(value: Option<&reqwest::header::HeaderValue>) -> Option<u64> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| (secs * 1000.0) as u64)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_delay_ms, 250);
        assert_eq!(config.max_delay_ms, 5000);
    }

    #[test]
    fn test_calculate_delay_with_retry_after() {
        let config = RetryConfig::default();
        let delay = calculate_delay(&config, 0, Some(2000));
        assert_eq!(delay, Duration::from_millis(2000));
    }

    #[test]
    fn test_calculate_delay_bounds() {
        let config = RetryConfig::default();
        for attempt in 0..12 {
            let delay = calculate_delay(&config, attempt, None);
            assert!(delay.as_millis() >= 250);
            assert!(delay.as_millis() <= 5000);
        }
    }

    #[test]
    fn test_parse_retry_after() {
        use reqwest::header::HeaderValue;
        assert_eq!(parse_retry_after(Some(&HeaderValue::from_static("2"))), Some(2000));
        assert_eq!(parse_retry_after(Some(&HeaderValue::from_static("0.5"))), Some(500));
        assert_eq!(parse_retry_after(Some(&HeaderValue::from_static("soon"))), None);
        assert_eq!(parse_retry_after(None), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_recovers_from_transient_errors() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = with_retry(&RetryConfig::default(), "page", move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(FeedError::from_http_status(503, "busy"))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: FeedResult<()> = with_retry(&RetryConfig::default(), "page", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(FeedError::RateLimited {
                retry_after_ms: Some(100),
            })
        })
        .await;

        assert!(matches!(result, Err(FeedError::RateLimited { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_with_retry_does_not_retry_auth_errors() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: FeedResult<()> = tokio_test::block_on(with_retry(
            &RetryConfig::default(),
            "token",
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(FeedError::auth_error("invalid_grant"))
            },
        ));

        assert!(matches!(result, Err(FeedError::AuthError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
