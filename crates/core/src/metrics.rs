//! Prometheus metrics for the search connector.
//!
//! This module provides metrics for:
//! - Requests issued to KAT (per sort order and outcome)
//! - Parsing (records produced, failed payloads)
//! - Whole searches (duration, result counts)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts};

// =============================================================================
// Requests
// =============================================================================

/// Requests to KAT by sort field and outcome.
pub static KAT_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("katsearch_requests_total", "Total requests issued to KAT"),
        &["sort", "outcome"], // "ok", "transport_error", "empty", "bad_status", "parse_error"
    )
    .unwrap()
});

// =============================================================================
// Parsing
// =============================================================================

/// Records produced by the parsers.
pub static RECORDS_PARSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("katsearch_records_parsed_total", "Total result records parsed"),
        &["mode"], // "feed", "html"
    )
    .unwrap()
});

/// Payloads rejected with a parse error.
pub static PARSE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "katsearch_parse_failures_total",
            "Total payloads that failed to parse",
        ),
        &["mode"],
    )
    .unwrap()
});

// =============================================================================
// Searches
// =============================================================================

/// Duration of a full search across all terms.
pub static SEARCH_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "katsearch_search_duration_seconds",
            "Duration of a search across all terms and sort orders",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
    )
    .unwrap()
});

/// Distinct records returned per search.
pub static SEARCH_RESULTS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("katsearch_search_results", "Records returned per search")
            .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(KAT_REQUESTS.clone()),
        Box::new(RECORDS_PARSED.clone()),
        Box::new(PARSE_FAILURES.clone()),
        Box::new(SEARCH_DURATION.clone()),
        Box::new(SEARCH_RESULTS.clone()),
    ]
}
