//! Shared data models for the feedreel compilation pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Feed selection (scope, sort order, time window)
//! - Discovered candidates and their media kinds
//! - Acquired and enriched items flowing through the pipeline
//! - Compliance options and verdicts
//! - The shared output frame and encoding settings

pub mod candidate;
pub mod compliance;
pub mod encoding;
pub mod feed;
pub mod frame;
pub mod item;
pub mod media_info;

// Re-export common types
pub use candidate::{Candidate, MediaKind, SourceId};
pub use compliance::{
    ComplianceOptions, ComplianceVerdict, HashFailurePolicy, RejectReason,
    DEFAULT_DUPLICATE_THRESHOLD,
};
pub use encoding::EncodingConfig;
pub use feed::{FeedScope, FeedSelector, ParseSelectorError, SortOrder, TimeWindow};
pub use frame::{TargetFrame, MAX_FRAME_HEIGHT, MAX_FRAME_WIDTH};
pub use item::{AcquiredItem, EnrichedItem};
pub use media_info::{MediaInfo, VideoStream};
