//! Pipeline metrics.

use metrics::counter;

pub mod names {
    /// Items evaluated by the compliance filter, by verdict.
    pub const ITEMS_TOTAL: &str = "feedreel_items_total";

    /// Per-item failures, by stage.
    pub const ITEM_FAILURES_TOTAL: &str = "feedreel_item_failures_total";

    /// Cache hits on the output directory, by stage.
    pub const CACHE_HITS_TOTAL: &str = "feedreel_cache_hits_total";
}

pub fn record_verdict(accepted: bool) {
    let verdict = if accepted { "accept" } else { "reject" };
    counter!(names::ITEMS_TOTAL, "verdict" => verdict).increment(1);
}

pub fn record_item_failure(stage: &'static str) {
    counter!(names::ITEM_FAILURES_TOTAL, "stage" => stage).increment(1);
}

pub fn record_cache_hit(stage: &'static str) {
    counter!(names::CACHE_HITS_TOTAL, "stage" => stage).increment(1);
}
