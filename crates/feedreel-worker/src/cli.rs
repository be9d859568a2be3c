//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::config::WorkerConfig;
use feedreel_media::{DEFAULT_SAFE_MARGIN, DEFAULT_TRANSITION_DURATION};
use feedreel_models::{
    FeedScope, FeedSelector, HashFailurePolicy, SortOrder, TimeWindow,
    DEFAULT_DUPLICATE_THRESHOLD,
};

/// Compile short videos from a feed into one video with cross-fades.
#[derive(Debug, Clone, Parser)]
#[command(name = "feedreel", version, about)]
pub struct Cli {
    /// Community (or user, with --user) to read from
    #[arg(env = "FEEDREEL_SOURCE")]
    pub source: String,

    /// Read a user's overview instead of a community
    #[arg(short = 'u', long, env = "FEEDREEL_USER_MODE")]
    pub user: bool,

    /// Listing sort order
    #[arg(short, long, default_value_t = SortOrder::default(), env = "FEEDREEL_SORT")]
    pub sort: SortOrder,

    /// Time window for top, controversial and search listings
    #[arg(short = 't', long = "time", env = "FEEDREEL_TIME")]
    pub time: Option<TimeWindow>,

    /// Free-text search within the community
    #[arg(short, long, env = "FEEDREEL_QUERY")]
    pub query: Option<String>,

    /// Number of videos to compile
    #[arg(short = 'n', long, default_value_t = 10, env = "FEEDREEL_COUNT")]
    pub count: u32,

    /// Reject videos longer than this many seconds
    #[arg(long, env = "FEEDREEL_MAX_DURATION")]
    pub max_duration: Option<f64>,

    /// Reject videos shorter than this many seconds
    #[arg(long, env = "FEEDREEL_MIN_DURATION")]
    pub min_duration: Option<f64>,

    /// Reject videos with fewer pixels (width x height) than this
    #[arg(long, env = "FEEDREEL_MIN_RESOLUTION")]
    pub min_resolution: Option<u64>,

    #[arg(long, env = "FEEDREEL_SKIP_NO_AUDIO")]
    pub skip_no_audio: bool,

    /// Only accept portrait videos
    #[arg(long, env = "FEEDREEL_VERTICAL_ONLY")]
    pub vertical: bool,

    /// Only accept landscape videos
    #[arg(long, env = "FEEDREEL_HORIZONTAL_ONLY")]
    pub horizontal: bool,

    /// Disable perceptual duplicate detection
    #[arg(long, env = "FEEDREEL_ALLOW_DUPLICATES")]
    pub allow_duplicates: bool,

    /// Hamming distance at or below which two videos are duplicates
    #[arg(long, default_value_t = DEFAULT_DUPLICATE_THRESHOLD, env = "FEEDREEL_DUPLICATE_THRESHOLD")]
    pub duplicate_threshold: u32,

    /// What to do when a duplicate check fails: accept or abort
    #[arg(long, default_value = "accept", value_parser = parse_hash_failure, env = "FEEDREEL_HASH_FAILURE")]
    pub hash_failure: HashFailurePolicy,

    /// Cross-fade length in seconds
    #[arg(long, default_value_t = DEFAULT_TRANSITION_DURATION, env = "FEEDREEL_TRANSITION_DURATION")]
    pub transition_duration: f64,

    /// Seconds subtracted from every cross-fade offset
    #[arg(long, default_value_t = DEFAULT_SAFE_MARGIN, env = "FEEDREEL_SAFE_MARGIN")]
    pub safe_margin: f64,

    /// Output root (defaults to FEEDREEL_OUTPUT_DIR or ./output)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Font file for title cards
    #[arg(long)]
    pub font_file: Option<PathBuf>,

    /// Delete normalized clips after a successful render
    #[arg(long, env = "FEEDREEL_CLEANUP")]
    pub cleanup: bool,

    /// Verbose logging, engine stderr forwarding, keep title cards
    #[arg(short, long, env = "FEEDREEL_DEBUG")]
    pub debug: bool,

    /// Clips normalized concurrently
    #[arg(long)]
    pub normalize_chunk: Option<usize>,

    /// Frame hashes computed concurrently
    #[arg(long)]
    pub hash_concurrency: Option<usize>,

    /// Write the run report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

fn parse_hash_failure(value: &str) -> Result<HashFailurePolicy, String> {
    match value.to_ascii_lowercase().as_str() {
        "accept" => Ok(HashFailurePolicy::Accept),
        "abort" => Ok(HashFailurePolicy::Abort),
        other => Err(format!("expected 'accept' or 'abort', got '{}'", other)),
    }
}

impl Cli {
    pub fn selector(&self) -> FeedSelector {
        let scope = if self.user {
            FeedScope::User(self.source.clone())
        } else {
            FeedScope::Community(self.source.clone())
        };
        let mut selector = FeedSelector::new(scope, self.count).with_sort(self.sort);
        if let Some(window) = self.time {
            selector = selector.with_time_window(window);
        }
        if let Some(query) = &self.query {
            selector = selector.with_query(query.clone());
        }
        selector
    }

    /// Build the worker configuration, layering flags over the environment.
    ///
    /// The result is not validated here.
    pub fn into_config(self) -> WorkerConfig {
        let mut config = WorkerConfig::from_env(self.selector());

        let rules = &mut config.compliance;
        rules.max_duration = self.max_duration;
        rules.min_duration = self.min_duration;
        rules.min_resolution = self.min_resolution;
        rules.skip_no_audio = self.skip_no_audio;
        rules.vertical_only = self.vertical;
        rules.horizontal_only = self.horizontal;
        rules.skip_duplicates = !self.allow_duplicates;
        rules.duplicate_threshold = self.duplicate_threshold;
        rules.hash_failure_policy = self.hash_failure;

        config.transition_duration = self.transition_duration;
        config.safe_margin = self.safe_margin;
        config.cleanup = self.cleanup;
        config.debug = self.debug;
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(font) = self.font_file {
            config.font_file = Some(font);
        }
        if let Some(chunk) = self.normalize_chunk {
            config.normalize_chunk = chunk;
        }
        if let Some(concurrency) = self.hash_concurrency {
            config.hash_concurrency = concurrency;
        }
        config
    }
}
