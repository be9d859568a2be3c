//! Run orchestration: walk, acquire, filter, normalize, compile.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::Instrument;

use crate::acquisition::Acquirer;
use crate::compiler::Compiler;
use crate::compliance::ComplianceFilter;
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::RunLogger;
use crate::metrics;
use crate::normalizer::Normalizer;
use crate::progress::{LoggingObserver, ProgressObserver};
use feedreel_feed::{FeedSource, FeedWalker};
use feedreel_media::fs_utils::ensure_dir;
use feedreel_media::{DuplicateDetector, EngineFrameHasher, FrameHasher, MediaEngine, TitleCardRenderer};
use feedreel_models::{ComplianceVerdict, EnrichedItem, RejectReason};

/// Summary of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub source: String,
    pub requested: u32,
    /// Candidates produced by the feed walker
    pub discovered: u32,
    pub accepted: usize,
    /// Accepted items that made it through normalization
    pub normalized: usize,
    /// Rejection counts keyed by reason
    pub rejected: BTreeMap<String, usize>,
    pub acquisition_failures: usize,
    pub output: Option<PathBuf>,
    /// Cross-fade start times of the final render
    pub offsets: Vec<f64>,
    /// Set when the walk was cut short by an upstream failure
    pub feed_error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    fn new(source: String, requested: u32) -> Self {
        let now = Utc::now();
        Self {
            source,
            requested,
            discovered: 0,
            accepted: 0,
            normalized: 0,
            rejected: BTreeMap::new(),
            acquisition_failures: 0,
            output: None,
            offsets: Vec::new(),
            feed_error: None,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn ended_early(&self) -> bool {
        self.feed_error.is_some()
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{}: {}/{} videos accepted ({} discovered, {} rejected, {} failed)",
            self.source,
            self.accepted,
            self.requested,
            self.discovered,
            self.rejected_total(),
            self.acquisition_failures
        );
        match &self.output {
            Some(path) => out.push_str(&format!(", output {}", path.display())),
            None => out.push_str(", no output produced"),
        }
        if let Some(err) = &self.feed_error {
            out.push_str(&format!(", feed ended early: {}", err));
        }
        out
    }
}

fn reason_key(reason: &RejectReason) -> String {
    match reason {
        RejectReason::DuplicateCheckFailed(_) => "Duplicate check failed".to_string(),
        other => other.to_string(),
    }
}

/// One configured compilation run.
pub struct Pipeline {
    config: WorkerConfig,
    source: Arc<dyn FeedSource>,
    engine: Arc<dyn MediaEngine>,
    hasher: Arc<dyn FrameHasher>,
    http: reqwest::Client,
    observer: Arc<dyn ProgressObserver>,
}

impl Pipeline {
    pub fn new(
        config: WorkerConfig,
        source: Arc<dyn FeedSource>,
        engine: Arc<dyn MediaEngine>,
    ) -> WorkerResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("feedreel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WorkerError::config_error(format!("HTTP client: {}", e)))?;
        let logger = RunLogger::new(config.selector.scope.to_string(), "compile");

        Ok(Self {
            hasher: Arc::new(EngineFrameHasher::new(Arc::clone(&engine))),
            observer: Arc::new(LoggingObserver::new(logger)),
            config,
            source,
            engine,
            http,
        })
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn FrameHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Execute the run.
    ///
    /// Only invalid configuration and a failed final render are errors.
    /// Upstream failures end the walk early and are recorded in the report;
    /// per-item failures drop the item.
    pub async fn run(&self) -> WorkerResult<RunReport> {
        self.config.validate()?;

        let logger = RunLogger::new(self.config.selector.scope.to_string(), "compile");
        let span = logger.create_span();
        self.execute(&logger).instrument(span).await
    }

    async fn execute(&self, logger: &RunLogger) -> WorkerResult<RunReport> {
        let selector = &self.config.selector;
        let mut report = RunReport::new(selector.scope.to_string(), selector.target_count);
        logger.log_start(&selector.describe());

        let dir = self.config.source_dir();
        ensure_dir(&dir).await?;

        let accepted = self.collect(&dir, &mut report).await;
        report.accepted = accepted.len();
        if accepted.len() < selector.target_count as usize {
            logger.log_warning(&format!(
                "Only {} of {} requested videos were accepted",
                accepted.len(),
                selector.target_count
            ));
        }

        let normalizer = Normalizer::new(Arc::clone(&self.engine), self.config.encoding.clone())
            .with_title_renderer(
                TitleCardRenderer::new().with_font_file(self.config.font_file.clone()),
            )
            .with_chunk_size(self.config.normalize_chunk)
            .with_keep_title_cards(self.config.debug);
        let clips = normalizer
            .normalize_all(&accepted, &dir, Arc::clone(&self.observer))
            .await;
        report.normalized = clips.len();

        let compiler = Compiler::new(Arc::clone(&self.engine), self.config.encoding.clone())
            .with_transition(self.config.transition_duration, self.config.safe_margin)
            .with_cleanup(self.config.cleanup);
        let outcome = match compiler
            .compile(&clips, &self.config.compilation_path(), Arc::clone(&self.observer))
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                logger.log_error(&format!("Compilation failed: {}", e));
                return Err(e);
            }
        };

        report.output = outcome.output().map(|p| p.to_path_buf());
        report.offsets = outcome.offsets().to_vec();
        report.finished_at = Utc::now();
        logger.log_completion(&report.summary());
        Ok(report)
    }

    /// Walk the feed until enough items are accepted or the feed runs out.
    async fn collect(&self, dir: &std::path::Path, report: &mut RunReport) -> Vec<EnrichedItem> {
        let target = self.config.selector.target_count as usize;
        let detector = Arc::new(
            DuplicateDetector::new(Arc::clone(&self.hasher))
                .with_concurrency(self.config.hash_concurrency),
        );
        let filter = ComplianceFilter::new(self.config.compliance.clone(), detector);
        let acquirer = Acquirer::new(self.http.clone(), Arc::clone(&self.engine), dir);
        let mut walker = FeedWalker::new(Arc::clone(&self.source), self.config.selector.clone())
            .with_request_interval(self.config.request_interval);

        let mut accepted: Vec<EnrichedItem> = Vec::with_capacity(target);

        while accepted.len() < target {
            let Some(candidate) = walker.next().await else {
                break;
            };
            self.observer.candidate_discovered(&candidate);

            let item = match acquirer.acquire(&candidate).await {
                Ok(acquired) => acquirer.enrich(acquired).await,
                Err(e) => Err(e),
            };
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    report.acquisition_failures += 1;
                    metrics::record_item_failure("acquire");
                    self.observer.item_failed(&candidate, &e.to_string());
                    continue;
                }
            };

            let verdict = filter.evaluate(&item, &accepted).await;
            metrics::record_verdict(verdict.is_accept());
            match verdict {
                ComplianceVerdict::Accept => {
                    accepted.push(item);
                    if let Some(item) = accepted.last() {
                        self.observer
                            .item_accepted(item, accepted.len(), self.config.selector.target_count);
                    }
                }
                ComplianceVerdict::Reject(reasons) => {
                    for reason in &reasons {
                        *report.rejected.entry(reason_key(reason)).or_default() += 1;
                    }
                    self.observer.item_rejected(&candidate, &reasons);
                }
            }
        }

        report.discovered = walker.emitted();
        report.feed_error = walker.failure().map(ToString::to_string);
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_summary() {
        let mut report = RunReport::new("r/aww".into(), 5);
        report.accepted = 2;
        report.discovered = 4;
        report.rejected.insert("Video is too long".into(), 1);
        report.acquisition_failures = 1;
        report.feed_error = Some("Server error (503): down".into());

        let summary = report.summary();
        assert!(summary.starts_with("r/aww: 2/5 videos accepted (4 discovered, 1 rejected, 1 failed)"));
        assert!(summary.contains("no output produced"));
        assert!(report.ended_early());
    }

    #[test]
    fn test_reason_key_groups_hash_failures() {
        assert_eq!(
            reason_key(&RejectReason::DuplicateCheckFailed("no frame".into())),
            "Duplicate check failed"
        );
        assert_eq!(reason_key(&RejectReason::NoAudio), "Video has no audio");
    }

    #[test]
    fn test_report_serializes() {
        let report = RunReport::new("u/spez".into(), 3);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["requested"], 3);
        assert!(json["output"].is_null());
    }
}
