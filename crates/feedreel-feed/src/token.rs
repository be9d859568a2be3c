//! Access token for the feed API.
//!
//! The token is requested lazily on first use and reused for the lifetime of
//! the client. A rejected token is invalidated and fetched again once.

use std::future::Future;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{FeedError, FeedResult};

/// Refresh this long before the advertised expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Password-grant token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Set instead of a token when the grant was refused
    #[serde(default)]
    pub error: Option<String>,
}

impl TokenResponse {
    pub fn into_token(self) -> FeedResult<CachedToken> {
        match self.access_token.filter(|t| !t.is_empty()) {
            Some(access_token) => Ok(CachedToken {
                access_token,
                expires_at: self
                    .expires_in
                    .map(|secs| Instant::now() + Duration::from_secs(secs)),
            }),
            None => Err(FeedError::auth_error(format!(
                "token endpoint returned no access_token ({})",
                self.error.as_deref().unwrap_or("no error given")
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachedToken {
    access_token: String,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Instant::now() + TOKEN_REFRESH_MARGIN < expires_at,
            None => true,
        }
    }
}

/// Single-flight token cache.
#[derive(Debug, Default)]
pub struct TokenCache {
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token, calling `refresh` only when none is valid.
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> FeedResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FeedResult<CachedToken>>,
    {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|c| c.is_valid()) {
                return Ok(cached.access_token.clone());
            }
        }

        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(cached) = cache.as_ref().filter(|c| c.is_valid()) {
            return Ok(cached.access_token.clone());
        }

        let token = refresh().await?;
        debug!("Obtained feed access token");
        let value = token.access_token.clone();
        *cache = Some(token);
        Ok(value)
    }

    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }
}
