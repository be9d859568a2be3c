//! Feed metrics collection.
//!
//! - Request counters by endpoint and status
//! - Latency histograms
//! - Retry counters
//! - Classified candidate counters by media kind

use metrics::{counter, histogram};

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Total feed requests by endpoint and status.
    pub const REQUESTS_TOTAL: &str = "feed_requests_total";

    /// Total retry attempts by operation.
    pub const RETRIES_TOTAL: &str = "feed_retries_total";

    /// Request latency in seconds by endpoint.
    pub const LATENCY_SECONDS: &str = "feed_latency_seconds";

    /// Candidates emitted by the walker, by media kind.
    pub const CANDIDATES_TOTAL: &str = "feed_candidates_total";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record metrics for a completed feed request.
pub fn record_request(endpoint: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "endpoint" => endpoint.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a retry attempt.
pub fn record_retry(operation: &str) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record one classified candidate.
pub fn record_candidate(kind: &'static str) {
    counter!(names::CANDIDATES_TOTAL, "kind" => kind).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::REQUESTS_TOTAL.contains("requests"));
        assert!(names::RETRIES_TOTAL.contains("retries"));
        assert!(names::LATENCY_SECONDS.contains("latency"));
        assert!(names::CANDIDATES_TOTAL.starts_with("feed_"));
    }
}
