//! Feed API client.
//!
//! - Password-grant token cached for the lifetime of the client
//! - HTTP client tuning (pooling, timeouts, user agent)
//! - Exponential backoff with jitter on transient failures
//! - Observability (tracing spans, metrics)

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, info_span, Instrument};

use crate::config::{FeedConfig, FeedCredentials, PAGE_SIZE};
use crate::error::{FeedError, FeedResult};
use crate::listing::{Listing, ListingPage};
use crate::metrics::record_request;
use crate::retry::{parse_retry_after, with_retry};
use crate::token::{CachedToken, TokenCache, TokenResponse};
use crate::walker::FeedSource;
use feedreel_models::{FeedScope, FeedSelector};

// =============================================================================
// Request construction
// =============================================================================

/// A fully resolved listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub url: String,
    pub params: Vec<(&'static str, String)>,
}

impl ListingRequest {
    /// Resolve the endpoint and query parameters for one page.
    ///
    /// Communities are read from `r/{name}/{sort}` (or `r/{name}/search` when
    /// a query is given); users from `user/{name}/overview` with `sort` as a
    /// parameter. Free-text search is not available for users.
    pub fn build(api_base: &str, selector: &FeedSelector, after: Option<&str>) -> FeedResult<Self> {
        let base = api_base.trim_end_matches('/');
        let mut params: Vec<(&'static str, String)> = Vec::new();

        let url = match (&selector.scope, &selector.query) {
            (FeedScope::User(_), Some(_)) => {
                return Err(FeedError::invalid_config(
                    "free-text search is not supported for user feeds",
                ))
            }
            (FeedScope::User(name), None) => {
                params.push(("sort", selector.sort.as_str().to_string()));
                format!("{}/user/{}/overview", base, name)
            }
            (FeedScope::Community(name), Some(query)) => {
                params.push(("q", query.clone()));
                params.push(("restrict_sr", "1".to_string()));
                params.push(("sort", selector.sort.as_str().to_string()));
                format!("{}/r/{}/search", base, name)
            }
            (FeedScope::Community(name), None) => {
                format!("{}/r/{}/{}", base, name, selector.sort.as_str())
            }
        };

        if let Some(window) = selector.time_window {
            params.push(("t", window.as_str().to_string()));
        }
        params.push(("limit", PAGE_SIZE.to_string()));
        if let Some(cursor) = after {
            params.push(("after", cursor.to_string()));
        }
        params.push(("raw_json", "1".to_string()));

        Ok(Self { url, params })
    }
}

// =============================================================================
// Client
// =============================================================================

/// Authenticated feed API client.
#[derive(Clone)]
pub struct FeedClient {
    http: Client,
    config: FeedConfig,
    credentials: FeedCredentials,
    token_cache: Arc<TokenCache>,
}

impl FeedClient {
    pub fn new(config: FeedConfig, credentials: FeedCredentials) -> FeedResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(FeedError::Network)?;

        Ok(Self {
            http,
            config,
            credentials,
            token_cache: Arc::new(TokenCache::new()),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> FeedResult<Self> {
        Self::new(FeedConfig::from_env()?, FeedCredentials::from_env()?)
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Get an access token, requesting one on first use.
    pub async fn access_token(&self) -> FeedResult<String> {
        self.token_cache
            .get_or_refresh(move || async move {
                with_retry(&self.config.retry, "token", move || self.request_token()).await
            })
            .await
    }

    async fn request_token(&self) -> FeedResult<CachedToken> {
        let started = Instant::now();
        let response = self
            .http
            .post(&self.config.auth_url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[
                ("grant_type", "password"),
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        record_request("token", status.as_u16(), started.elapsed().as_secs_f64() * 1000.0);

        if !status.is_success() {
            return Err(Self::handle_error_response(status, &self.config.auth_url, response).await);
        }

        let body: TokenResponse = response.json().await?;
        body.into_token()
    }

    /// Fetch one listing page.
    ///
    /// A 401 invalidates the cached token and retries once with a fresh one.
    pub async fn fetch_listing(
        &self,
        selector: &FeedSelector,
        after: Option<&str>,
    ) -> FeedResult<ListingPage> {
        let request = ListingRequest::build(&self.config.api_base, selector, after)?;
        let span = info_span!("feed_page", scope = %selector.scope, after = after.unwrap_or(""));

        async {
            let token = self.access_token().await?;
            match self.get_listing(&request, &token).await {
                Err(FeedError::AuthError(msg)) => {
                    debug!("Listing request rejected ({}), refreshing token", msg);
                    self.token_cache.invalidate().await;
                    let token = self.access_token().await?;
                    self.get_listing(&request, &token).await
                }
                other => other,
            }
        }
        .instrument(span)
        .await
    }

    async fn get_listing(&self, request: &ListingRequest, token: &str) -> FeedResult<ListingPage> {
        with_retry(&self.config.retry, "listing", move || async move {
            let started = Instant::now();
            let response = self
                .http
                .get(&request.url)
                .bearer_auth(token)
                .query(&request.params)
                .send()
                .await?;

            let status = response.status();
            record_request("listing", status.as_u16(), started.elapsed().as_secs_f64() * 1000.0);

            if status != StatusCode::OK {
                return Err(Self::handle_error_response(status, &request.url, response).await);
            }

            let listing: Listing = response.json().await?;
            let page = ListingPage::from(listing);
            debug!(
                entries = page.entries.len(),
                has_next = page.after.is_some(),
                "Fetched listing page"
            );
            Ok(page)
        })
        .await
    }

    async fn handle_error_response(status: StatusCode, url: &str, response: Response) -> FeedError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms =
                parse_retry_after(response.headers().get(reqwest::header::RETRY_AFTER));
            return FeedError::RateLimited { retry_after_ms };
        }
        let body = response.text().await.unwrap_or_default();
        FeedError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}

#[async_trait]
impl FeedSource for FeedClient {
    async fn fetch_page(
        &self,
        selector: &FeedSelector,
        after: Option<&str>,
    ) -> FeedResult<ListingPage> {
        self.fetch_listing(selector, after).await
    }

    fn permalink_base(&self) -> &str {
        &self.config.permalink_base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryConfig;
    use feedreel_models::{SortOrder, TimeWindow};
    use wiremock::matchers::{basic_auth, body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> FeedCredentials {
        FeedCredentials {
            client_id: "cid".into(),
            client_secret: "csecret".into(),
            username: "bot".into(),
            password: "pw".into(),
        }
    }

    fn client_for(server: &MockServer) -> FeedClient {
        let config = FeedConfig::default()
            .with_base_url(&server.uri())
            .unwrap()
            .with_retry(RetryConfig {
                max_retries: 2,
                base_delay_ms: 1,
                max_delay_ms: 5,
            });
        FeedClient::new(config, credentials()).unwrap()
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .and(basic_auth("cid", "csecret"))
            .and(body_string_contains("grant_type=password"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "tok", "expires_in": 86400})),
            )
            .expect(1)
            .mount(server)
            .await;
    }

    fn listing_body(after: Option<&str>) -> serde_json::Value {
        serde_json::json!({
            "kind": "Listing",
            "data": {
                "after": after,
                "children": [
                    {"kind": "t3", "data": {"id": "a1", "title": "One", "author": "x", "permalink": "/r/aww/a1"}}
                ]
            }
        })
    }

    #[test]
    fn test_build_community_request() {
        let selector = FeedSelector::new(FeedScope::Community("aww".into()), 5)
            .with_sort(SortOrder::Top)
            .with_time_window(TimeWindow::Week);
        let req = ListingRequest::build("https://api.example/", &selector, Some("t3_x")).unwrap();

        assert_eq!(req.url, "https://api.example/r/aww/top");
        assert_eq!(
            req.params,
            vec![
                ("t", "week".to_string()),
                ("limit", "50".to_string()),
                ("after", "t3_x".to_string()),
                ("raw_json", "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_build_user_request() {
        let selector =
            FeedSelector::new(FeedScope::User("spez".into()), 5).with_sort(SortOrder::New);
        let req = ListingRequest::build("https://api.example", &selector, None).unwrap();

        assert_eq!(req.url, "https://api.example/user/spez/overview");
        assert_eq!(req.params[0], ("sort", "new".to_string()));
        assert!(!req.params.iter().any(|(k, _)| *k == "after"));
    }

    #[test]
    fn test_build_search_request() {
        let selector = FeedSelector::new(FeedScope::Community("aww".into()), 5)
            .with_sort(SortOrder::Relevance)
            .with_query("corgi");
        let req = ListingRequest::build("https://api.example", &selector, None).unwrap();

        assert_eq!(req.url, "https://api.example/r/aww/search");
        assert!(req.params.contains(&("q", "corgi".to_string())));
        assert!(req.params.contains(&("restrict_sr", "1".to_string())));
        assert!(req.params.contains(&("sort", "relevance".to_string())));
    }

    #[test]
    fn test_user_search_rejected() {
        let selector = FeedSelector::new(FeedScope::User("spez".into()), 5).with_query("x");
        assert!(matches!(
            ListingRequest::build("https://api.example", &selector, None),
            Err(FeedError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_listing_uses_bearer_token() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/r/aww/top"))
            .and(header("authorization", "Bearer tok"))
            .and(query_param("limit", "50"))
            .and(query_param("raw_json", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(Some("t3_a1"))))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let selector = FeedSelector::new(FeedScope::Community("aww".into()), 3);

        let first = client.fetch_listing(&selector, None).await.unwrap();
        let second = client.fetch_listing(&selector, Some("t3_a1")).await.unwrap();

        assert_eq!(first.entries[0].id, "a1");
        assert_eq!(first.after.as_deref(), Some("t3_a1"));
        assert_eq!(second.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_listing_retries_server_errors() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/r/aww/top"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/r/aww/top"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(None)))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let selector = FeedSelector::new(FeedScope::Community("aww".into()), 3);
        let page = client.fetch_listing(&selector, None).await.unwrap();

        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.after, None);
    }

    #[tokio::test]
    async fn test_missing_token_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"error": "invalid_grant"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.access_token().await.unwrap_err();
        assert!(matches!(err, FeedError::AuthError(_)));
    }
}
