//! Lazy, rate-limited walk over a paginated feed.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::classify::classify_entry;
use crate::config::{interval_for, DEFAULT_PERMALINK_BASE, DEFAULT_REQUESTS_PER_MINUTE};
use crate::error::{FeedError, FeedResult};
use crate::listing::{ListingPage, RawEntry};
use crate::metrics::record_candidate;
use feedreel_models::{Candidate, FeedSelector};

/// Anything that can serve listing pages.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_page(
        &self,
        selector: &FeedSelector,
        after: Option<&str>,
    ) -> FeedResult<ListingPage>;

    /// Prefix for entry permalinks.
    fn permalink_base(&self) -> &str {
        DEFAULT_PERMALINK_BASE
    }
}

#[async_trait]
impl<T: FeedSource + ?Sized> FeedSource for Arc<T> {
    async fn fetch_page(
        &self,
        selector: &FeedSelector,
        after: Option<&str>,
    ) -> FeedResult<ListingPage> {
        (**self).fetch_page(selector, after).await
    }

    fn permalink_base(&self) -> &str {
        (**self).permalink_base()
    }
}

/// Produces candidates one at a time, fetching pages only when needed.
///
/// The walk is finite and cannot be restarted. It ends when the upstream
/// reports no further cursor or when a request fails; in the latter case the
/// failure is kept and every candidate already produced stays valid.
pub struct FeedWalker<S> {
    source: S,
    selector: FeedSelector,
    request_interval: Duration,
    cursor: Option<String>,
    buffer: VecDeque<RawEntry>,
    next_index: u32,
    pages_fetched: u32,
    exhausted: bool,
    failure: Option<FeedError>,
}

impl<S: FeedSource> FeedWalker<S> {
    pub fn new(source: S, selector: FeedSelector) -> Self {
        Self {
            source,
            selector,
            request_interval: interval_for(DEFAULT_REQUESTS_PER_MINUTE),
            cursor: None,
            buffer: VecDeque::new(),
            next_index: 0,
            pages_fetched: 0,
            exhausted: false,
            failure: None,
        }
    }

    /// Minimum pause between two page requests.
    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval;
        self
    }

    pub fn selector(&self) -> &FeedSelector {
        &self.selector
    }

    /// Next classified candidate, or `None` once the walk is over.
    pub async fn next(&mut self) -> Option<Candidate> {
        loop {
            while let Some(entry) = self.buffer.pop_front() {
                if let Some(candidate) =
                    classify_entry(&entry, self.next_index, self.source.permalink_base())
                {
                    self.next_index += 1;
                    record_candidate(candidate.media.as_str());
                    debug!(
                        item_id = %candidate.id,
                        index = candidate.index,
                        kind = %candidate.media,
                        "Discovered candidate"
                    );
                    return Some(candidate);
                }
            }

            if self.exhausted {
                return None;
            }
            self.fetch_next_page().await;
        }
    }

    /// Collect up to `limit` candidates.
    pub async fn take(&mut self, limit: usize) -> Vec<Candidate> {
        let mut out = Vec::with_capacity(limit.min(64));
        while out.len() < limit {
            match self.next().await {
                Some(candidate) => out.push(candidate),
                None => break,
            }
        }
        out
    }

    async fn fetch_next_page(&mut self) {
        if self.pages_fetched > 0 {
            tokio::time::sleep(self.request_interval).await;
        }

        info!(
            selector = %self.selector.describe(),
            page = self.pages_fetched + 1,
            "Fetching feed page"
        );

        let result = self
            .source
            .fetch_page(&self.selector, self.cursor.as_deref())
            .await;
        self.pages_fetched += 1;

        match result {
            Ok(page) => {
                let repeated = page.after.is_some() && page.after == self.cursor;
                self.buffer.extend(page.entries);
                self.cursor = page.after;
                if self.cursor.is_none() {
                    info!("No more pages available");
                    self.exhausted = true;
                } else if repeated {
                    warn!("Feed returned the same cursor twice, stopping");
                    self.exhausted = true;
                }
            }
            Err(e) => {
                warn!(
                    pages = self.pages_fetched,
                    candidates = self.next_index,
                    "Feed walk aborted: {}",
                    e
                );
                self.failure = Some(e);
                self.exhausted = true;
            }
        }
    }

    /// Number of candidates produced so far.
    pub fn emitted(&self) -> u32 {
        self.next_index
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// The error that ended the walk early, if any.
    pub fn failure(&self) -> Option<&FeedError> {
        self.failure.as_ref()
    }

    pub fn ended_early(&self) -> bool {
        self.failure.is_some()
    }
}
