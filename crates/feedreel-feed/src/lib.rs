//! Feed API client and candidate discovery.
//!
//! This crate provides:
//! - Password-grant authentication with a per-client cached token
//! - Listing requests with retry, backoff and `Retry-After` handling
//! - Classification of raw entries into typed candidates
//! - A lazy, rate-limited walker over paginated listings

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod listing;
pub mod metrics;
pub mod retry;
pub mod token;
pub mod walker;

pub use classify::{classify_entry, redgifs_direct_url};
pub use client::FeedClient;
pub use config::{FeedConfig, FeedCredentials};
pub use error::{FeedError, FeedResult};
pub use listing::{ListingPage, RawEntry};
pub use retry::RetryConfig;
pub use walker::{FeedSource, FeedWalker};
