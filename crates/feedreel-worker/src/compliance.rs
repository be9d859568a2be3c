//! Compliance filter: metadata rules, then the duplicate check.

use std::sync::Arc;

use tracing::{debug, warn};

use feedreel_media::{DuplicateDetector, HashSource};
use feedreel_models::{
    ComplianceOptions, ComplianceVerdict, EnrichedItem, HashFailurePolicy, RejectReason,
};

pub struct ComplianceFilter {
    options: ComplianceOptions,
    detector: Arc<DuplicateDetector>,
}

impl ComplianceFilter {
    pub fn new(options: ComplianceOptions, detector: Arc<DuplicateDetector>) -> Self {
        Self { options, detector }
    }

    pub fn options(&self) -> &ComplianceOptions {
        &self.options
    }

    /// Evaluate `item` against every enabled rule.
    ///
    /// The duplicate check only runs when no metadata rule triggered. A
    /// failed check follows the configured [`HashFailurePolicy`]. Frames are
    /// positioned from the enriched durations.
    pub async fn evaluate(
        &self,
        item: &EnrichedItem,
        prior_accepted: &[EnrichedItem],
    ) -> ComplianceVerdict {
        let mut reasons = self.options.metadata_reasons(item.metadata());

        if reasons.is_empty() && self.options.skip_duplicates {
            let candidate = HashSource::from(item);
            let prior: Vec<HashSource> = prior_accepted.iter().map(HashSource::from).collect();
            match self
                .detector
                .is_duplicate(&candidate, &prior, self.options.duplicate_threshold)
                .await
            {
                Ok(true) => reasons.push(RejectReason::Duplicate),
                Ok(false) => {}
                Err(e) => match self.options.hash_failure_policy {
                    HashFailurePolicy::Accept => {
                        warn!(item_id = %item.id(), "Duplicate check failed, keeping item: {}", e);
                    }
                    HashFailurePolicy::Abort => {
                        reasons.push(RejectReason::DuplicateCheckFailed(e.to_string()));
                    }
                },
            }
        }

        let verdict = ComplianceVerdict::from_reasons(reasons);
        debug!(item_id = %item.id(), accepted = verdict.is_accept(), "Compliance evaluated");
        verdict
    }
}
