//! Progress reporting.
//!
//! Observers are notified of per-item verdicts and of stage percentages;
//! they never influence control flow.

use std::sync::{Arc, Mutex};

use feedreel_media::ProgressCallback;
use feedreel_models::{Candidate, EnrichedItem, RejectReason};

use crate::logging::RunLogger;

/// Long-running stages that report percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Normalize,
    Compile,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Normalize => "normalize",
            Stage::Compile => "compile",
        }
    }
}

/// Receives pipeline progress. Every method has a no-op default.
pub trait ProgressObserver: Send + Sync {
    fn candidate_discovered(&self, _candidate: &Candidate) {}

    fn item_accepted(&self, _item: &EnrichedItem, _accepted: usize, _target: u32) {}

    fn item_rejected(&self, _candidate: &Candidate, _reasons: &[RejectReason]) {}

    fn item_failed(&self, _candidate: &Candidate, _error: &str) {}

    /// Overall stage completion in percent (0 to 100).
    fn stage_progress(&self, _stage: Stage, _percent: f64) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// Observer that reports through `tracing`.
///
/// Stage percentages are logged at most once per 10% step.
#[derive(Debug)]
pub struct LoggingObserver {
    logger: RunLogger,
    last_step: Mutex<Option<(Stage, u32)>>,
}

impl LoggingObserver {
    pub fn new(logger: RunLogger) -> Self {
        Self {
            logger,
            last_step: Mutex::new(None),
        }
    }
}

impl ProgressObserver for LoggingObserver {
    fn candidate_discovered(&self, candidate: &Candidate) {
        self.logger.log_progress(&format!(
            "#{} {} \"{}\" ({})",
            candidate.index, candidate.id, candidate.title, candidate.permalink
        ));
    }

    fn item_accepted(&self, item: &EnrichedItem, accepted: usize, target: u32) {
        self.logger.log_progress(&format!(
            "#{} {} accepted ({}/{}, {:.1}s)",
            item.index(),
            item.id(),
            accepted,
            target,
            item.duration()
        ));
    }

    fn item_rejected(&self, candidate: &Candidate, reasons: &[RejectReason]) {
        let reasons: Vec<String> = reasons.iter().map(ToString::to_string).collect();
        self.logger.log_progress(&format!(
            "#{} {} rejected: {}",
            candidate.index,
            candidate.id,
            reasons.join(", ")
        ));
    }

    fn item_failed(&self, candidate: &Candidate, error: &str) {
        self.logger.log_warning(&format!(
            "#{} {} dropped: {}",
            candidate.index, candidate.id, error
        ));
    }

    fn stage_progress(&self, stage: Stage, percent: f64) {
        let step = (percent.clamp(0.0, 100.0) / 10.0).floor() as u32;
        let Ok(mut last) = self.last_step.lock() else {
            return;
        };
        let is_new = match *last {
            Some((last_stage, last_step)) => last_stage != stage || step > last_step,
            None => true,
        };
        if is_new {
            *last = Some((stage, step));
            self.logger
                .log_progress(&format!("{}: {:.0}%", stage.as_str(), percent));
        }
    }
}

/// Overall percentage for a chunked stage.
///
/// Finished chunks count in full; the current chunk contributes the mean of
/// its items' percentages scaled to its share.
pub fn aggregate_progress(chunk_index: usize, chunk_count: usize, item_percents: &[f64]) -> f64 {
    if chunk_count == 0 {
        return 100.0;
    }
    let share = 100.0 / chunk_count as f64;
    let done = chunk_index as f64 * share;
    if item_percents.is_empty() {
        return done;
    }
    let mean = item_percents.iter().sum::<f64>() / item_percents.len() as f64;
    (done + mean / 100.0 * share).min(100.0)
}

/// Per-chunk tracker that turns item percentages into stage progress.
pub struct ChunkProgress {
    observer: Arc<dyn ProgressObserver>,
    stage: Stage,
    chunk_index: usize,
    chunk_count: usize,
    percents: Mutex<Vec<f64>>,
}

impl ChunkProgress {
    pub fn new(
        observer: Arc<dyn ProgressObserver>,
        stage: Stage,
        chunk_index: usize,
        chunk_count: usize,
        chunk_len: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            observer,
            stage,
            chunk_index,
            chunk_count,
            percents: Mutex::new(vec![0.0; chunk_len]),
        })
    }

    /// Engine callback for the item in `slot`.
    pub fn callback(self: &Arc<Self>, slot: usize) -> ProgressCallback {
        let tracker = Arc::clone(self);
        Arc::new(move |percent| tracker.update(slot, percent))
    }

    /// Mark an item finished regardless of what the engine reported.
    pub fn complete(&self, slot: usize) {
        self.update(slot, 100.0);
    }

    fn update(&self, slot: usize, percent: f64) {
        let overall = {
            let Ok(mut percents) = self.percents.lock() else {
                return;
            };
            if let Some(entry) = percents.get_mut(slot) {
                *entry = percent.clamp(0.0, 100.0);
            }
            aggregate_progress(self.chunk_index, self.chunk_count, &percents)
        };
        self.observer.stage_progress(self.stage, overall);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<f64>>,
    }

    impl ProgressObserver for Recorder {
        fn stage_progress(&self, _stage: Stage, percent: f64) {
            self.seen.lock().unwrap().push(percent);
        }
    }

    #[test]
    fn test_aggregate_progress() {
        assert_eq!(aggregate_progress(0, 2, &[0.0, 0.0]), 0.0);
        assert_eq!(aggregate_progress(0, 2, &[100.0, 50.0]), 37.5);
        assert_eq!(aggregate_progress(1, 2, &[100.0, 100.0]), 100.0);
        assert_eq!(aggregate_progress(1, 4, &[]), 25.0);
        assert_eq!(aggregate_progress(0, 0, &[]), 100.0);
    }

    #[test]
    fn test_chunk_progress_reports_overall() {
        let recorder = Arc::new(Recorder::default());
        let tracker = ChunkProgress::new(recorder.clone(), Stage::Normalize, 1, 2, 2);

        (tracker.callback(0))(50.0);
        tracker.complete(1);

        let seen = recorder.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![62.5, 87.5]);
    }

    #[test]
    fn test_out_of_range_slot_is_ignored() {
        let recorder = Arc::new(Recorder::default());
        let tracker = ChunkProgress::new(recorder.clone(), Stage::Compile, 0, 1, 1);
        tracker.complete(5);
        assert_eq!(recorder.seen.lock().unwrap().clone(), vec![0.0]);
    }
}
