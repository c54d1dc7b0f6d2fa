//! Firestore metrics collection.
//!
//! Standardized metrics for monitoring store operations:
//! - Request counters by operation and status
//! - Latency histograms
//! - Query result counters

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total Firestore requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "firestore_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "firestore_latency_seconds";

    /// Documents returned by structured queries, by collection.
    pub const QUERY_RESULTS_TOTAL: &str = "firestore_query_results_total";
}

/// Record metrics for a completed Firestore request.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    let status_str = status.to_string();

    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status_str
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record how many documents a structured query returned.
pub fn record_query_results(collection: &str, count: u64) {
    counter!(
        names::QUERY_RESULTS_TOTAL,
        "collection" => collection.to_string()
    )
    .increment(count);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::REQUESTS_TOTAL.contains("requests"));
        assert!(names::LATENCY_SECONDS.contains("latency"));
        assert!(names::QUERY_RESULTS_TOTAL.contains("query"));
    }
}
