//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{WorkerError, WorkerResult};
use feedreel_media::{DEFAULT_HASH_CONCURRENCY, DEFAULT_SAFE_MARGIN, DEFAULT_TRANSITION_DURATION};
use feedreel_models::{ComplianceOptions, EncodingConfig, FeedSelector};

/// Items normalized concurrently per chunk.
pub const DEFAULT_NORMALIZE_CHUNK: usize = 10;

const DEFAULT_OUTPUT_DIR: &str = "output";

/// Everything one compilation run needs.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub selector: FeedSelector,
    /// Root of the on-disk cache and final output
    pub output_dir: PathBuf,
    pub compliance: ComplianceOptions,
    pub encoding: EncodingConfig,
    /// Maximum concurrent normalizations
    pub normalize_chunk: usize,
    /// Maximum concurrent frame hashes during duplicate checks
    pub hash_concurrency: usize,
    /// Minimum pause between feed page requests
    pub request_interval: Duration,
    /// Cross-fade length in seconds
    pub transition_duration: f64,
    /// Subtracted from every cross-fade offset
    pub safe_margin: f64,
    pub font_file: Option<PathBuf>,
    /// Delete normalized clips after a successful render
    pub cleanup: bool,
    /// Forward engine stderr and keep intermediate title cards
    pub debug: bool,
    /// Per-invocation engine timeout
    pub engine_timeout: Option<Duration>,
}

impl WorkerConfig {
    pub fn new(selector: FeedSelector) -> Self {
        Self {
            selector,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            compliance: ComplianceOptions::default(),
            encoding: EncodingConfig::default(),
            normalize_chunk: DEFAULT_NORMALIZE_CHUNK,
            hash_concurrency: DEFAULT_HASH_CONCURRENCY,
            request_interval: Duration::from_millis(600),
            transition_duration: DEFAULT_TRANSITION_DURATION,
            safe_margin: DEFAULT_SAFE_MARGIN,
            font_file: None,
            cleanup: false,
            debug: false,
            engine_timeout: None,
        }
    }

    /// Create config from environment variables, on top of the defaults.
    pub fn from_env(selector: FeedSelector) -> Self {
        let mut config = Self::new(selector);
        if let Ok(dir) = std::env::var("FEEDREEL_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        config.normalize_chunk = std::env::var("FEEDREEL_NORMALIZE_CHUNK")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_NORMALIZE_CHUNK);
        config.hash_concurrency = std::env::var("FEEDREEL_HASH_CONCURRENCY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_HASH_CONCURRENCY);
        config.engine_timeout = std::env::var("FEEDREEL_ENGINE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs);
        config.font_file = std::env::var("FEEDREEL_FONT_FILE").ok().map(PathBuf::from);
        config
    }

    /// Reject option combinations that can never produce a run.
    pub fn validate(&self) -> WorkerResult<()> {
        let selector = &self.selector;
        if selector.scope.name().trim().is_empty() {
            return Err(WorkerError::config_error("source name must not be empty"));
        }
        if selector.target_count == 0 {
            return Err(WorkerError::config_error("video count must be greater than 0"));
        }
        if selector.scope.is_user() {
            if selector.query.is_some() {
                return Err(WorkerError::config_error(
                    "search queries are only supported for communities",
                ));
            }
            if selector.sort.is_search_only() {
                return Err(WorkerError::config_error(format!(
                    "sort order '{}' is only available with a search query",
                    selector.sort
                )));
            }
        } else if selector.sort.is_search_only() && selector.query.is_none() {
            return Err(WorkerError::config_error(format!(
                "sort order '{}' requires a search query",
                selector.sort
            )));
        }

        let rules = &self.compliance;
        if let (Some(min), Some(max)) = (rules.min_duration, rules.max_duration) {
            if min > max {
                return Err(WorkerError::config_error(format!(
                    "minimum duration ({}s) exceeds maximum duration ({}s)",
                    min, max
                )));
            }
        }
        if rules.vertical_only && rules.horizontal_only {
            return Err(WorkerError::config_error(
                "vertical-only and horizontal-only are mutually exclusive",
            ));
        }
        if !(self.transition_duration > 0.0) {
            return Err(WorkerError::config_error(
                "transition duration must be greater than 0",
            ));
        }
        if self.normalize_chunk == 0 || self.hash_concurrency == 0 {
            return Err(WorkerError::config_error(
                "concurrency limits must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Directory holding originals and normalized variants for this source.
    pub fn source_dir(&self) -> PathBuf {
        self.output_dir.join(self.selector.scope.label())
    }

    /// Final compilation output.
    pub fn compilation_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_compilation.mp4", self.selector.scope.label()))
    }
}
