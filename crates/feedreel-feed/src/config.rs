//! Feed client configuration.

use std::time::Duration;

use url::Url;

use crate::error::{FeedError, FeedResult};
use crate::retry::RetryConfig;

pub const DEFAULT_API_BASE: &str = "https://oauth.reddit.com";
pub const DEFAULT_AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
pub const DEFAULT_PERMALINK_BASE: &str = "https://reddit.com";
pub const DEFAULT_USER_AGENT: &str = concat!("feedreel/", env!("CARGO_PKG_VERSION"));

/// Entries requested per listing page.
pub const PAGE_SIZE: u32 = 50;

/// Upstream ceiling on listing requests.
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 100;

/// Password-grant credentials for the feed API.
#[derive(Clone)]
pub struct FeedCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for FeedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedCredentials")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl FeedCredentials {
    /// Read `FEED_CLIENT_ID`, `FEED_CLIENT_SECRET`, `FEED_USERNAME` and `FEED_PASSWORD`.
    pub fn from_env() -> FeedResult<Self> {
        Ok(Self {
            client_id: required_env("FEED_CLIENT_ID")?,
            client_secret: required_env("FEED_CLIENT_SECRET")?,
            username: required_env("FEED_USERNAME")?,
            password: required_env("FEED_PASSWORD")?,
        })
    }
}

fn required_env(key: &str) -> FeedResult<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(FeedError::invalid_config(format!("{} must be set", key))),
    }
}

/// Feed client configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Base URL of the authenticated listing API
    pub api_base: String,
    /// Token endpoint for the password grant
    pub auth_url: String,
    /// Prefix joined with each entry's relative permalink
    pub permalink_base: String,
    pub user_agent: String,
    /// Minimum pause between two listing page requests
    pub request_interval: Duration,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            permalink_base: DEFAULT_PERMALINK_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_interval: interval_for(DEFAULT_REQUESTS_PER_MINUTE),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
        }
    }
}

fn validated_url(key: &str, raw: &str) -> FeedResult<String> {
    Url::parse(raw)
        .map(|url| url.to_string())
        .map_err(|e| FeedError::invalid_config(format!("{}: {}", key, e)))
}

/// Pause between requests that keeps under `requests_per_minute`.
pub fn interval_for(requests_per_minute: u32) -> Duration {
    Duration::from_millis(60_000 / u64::from(requests_per_minute.max(1)))
}

impl FeedConfig {
    /// Create config from environment variables.
    pub fn from_env() -> FeedResult<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("FEED_API_BASE") {
            config.api_base = validated_url("FEED_API_BASE", &raw)?;
        }
        if let Ok(raw) = std::env::var("FEED_AUTH_URL") {
            config.auth_url = validated_url("FEED_AUTH_URL", &raw)?;
        }
        if let Ok(base) = std::env::var("FEED_PERMALINK_BASE") {
            config.permalink_base = base;
        }
        if let Ok(agent) = std::env::var("FEED_USER_AGENT") {
            if !agent.trim().is_empty() {
                config.user_agent = agent;
            }
        }
        if let Ok(raw) = std::env::var("FEED_REQUESTS_PER_MINUTE") {
            let rpm: u32 = raw.parse().map_err(|_| {
                FeedError::invalid_config(format!("FEED_REQUESTS_PER_MINUTE: not a number: {}", raw))
            })?;
            if rpm == 0 {
                return Err(FeedError::invalid_config(
                    "FEED_REQUESTS_PER_MINUTE must be greater than 0",
                ));
            }
            config.request_interval = interval_for(rpm);
        }
        config.retry = RetryConfig::from_env();

        Ok(config)
    }

    /// Point both endpoints at a single base URL (mock servers, proxies).
    pub fn with_base_url(mut self, base: &str) -> FeedResult<Self> {
        let base = Url::parse(base)
            .map_err(|e| FeedError::invalid_config(format!("base url: {}", e)))?;
        self.auth_url = base
            .join("api/v1/access_token")
            .map_err(|e| FeedError::invalid_config(e.to_string()))?
            .to_string();
        self.api_base = base.to_string();
        Ok(self)
    }

    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_for_default_ceiling() {
        assert_eq!(interval_for(100), Duration::from_millis(600));
        assert_eq!(interval_for(60), Duration::from_secs(1));
        assert_eq!(interval_for(0), Duration::from_secs(60));
    }

    #[test]
    fn test_default_config() {
        let config = FeedConfig::default();
        assert_eq!(config.api_base, "https://oauth.reddit.com");
        assert_eq!(config.request_interval, Duration::from_millis(600));
        assert!(config.user_agent.starts_with("feedreel/"));
    }

    #[test]
    fn test_with_base_url() {
        let config = FeedConfig::default()
            .with_base_url("http://127.0.0.1:9999/")
            .unwrap();
        assert_eq!(config.api_base, "http://127.0.0.1:9999/");
        assert_eq!(
            config.auth_url,
            "http://127.0.0.1:9999/api/v1/access_token"
        );
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let creds = FeedCredentials {
            client_id: "id".into(),
            client_secret: "s3cret".into(),
            username: "bot".into(),
            password: "hunter2".into(),
        };
        let shown = format!("{:?}", creds);
        assert!(!shown.contains("s3cret"));
        assert!(!shown.contains("hunter2"));
    }
}
