//! Media engine metrics.
//!
//! Recording is a no-op unless the host process installs a recorder.

use metrics::{counter, histogram};

// =============================================================================
// Metric Names
// =============================================================================

pub mod names {
    /// Engine invocations by job label and status.
    pub const RENDERS_TOTAL: &str = "feedreel_renders_total";

    /// Engine invocation wall time in seconds by job label.
    pub const RENDER_SECONDS: &str = "feedreel_render_seconds";

    /// Perceptual hash lookups served from the run cache.
    pub const HASH_CACHE_HITS_TOTAL: &str = "feedreel_hash_cache_hits_total";

    /// Bytes written by direct downloads.
    pub const DOWNLOAD_BYTES_TOTAL: &str = "feedreel_download_bytes_total";
}

// =============================================================================
// Recording Functions
// =============================================================================

pub fn record_render(label: &str, success: bool, elapsed_ms: f64) {
    counter!(
        names::RENDERS_TOTAL,
        "job" => label.to_string(),
        "status" => if success { "ok" } else { "error" }
    )
    .increment(1);

    histogram!(names::RENDER_SECONDS, "job" => label.to_string()).record(elapsed_ms / 1000.0);
}

pub fn record_hash_cache_hit() {
    counter!(names::HASH_CACHE_HITS_TOTAL).increment(1);
}

pub fn record_download_bytes(bytes: u64) {
    counter!(names::DOWNLOAD_BYTES_TOTAL).increment(bytes);
}
