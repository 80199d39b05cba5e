//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Import (runs, skipped records, rows and batches written)
//! - Query engine (queries per consumer and tier, index fallbacks)
//! - Write-through lookup
//! - External requests (Scryfall)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Import
// =============================================================================

/// Import runs by result.
pub static IMPORT_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cardvault_import_runs_total", "Total import runs"),
        &["result"], // "success", "failed", "timed_out", "already_running"
    )
    .expect("valid metric definition")
});

/// Import duration in seconds.
pub static IMPORT_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cardvault_import_duration_seconds",
            "Duration of a full import run",
        )
        .buckets(vec![5.0, 15.0, 30.0, 60.0, 120.0, 180.0, 300.0, 600.0]),
        &["result"],
    )
    .expect("valid metric definition")
});

/// Feed records not stored, by skip reason.
pub static RECORDS_SKIPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cardvault_records_skipped_total",
            "Feed records skipped during import",
        ),
        &["reason"], // "missing_oracle_id", "excluded_layout", "malformed"
    )
    .expect("valid metric definition")
});

/// Rows upserted by the import pipeline.
pub static ROWS_WRITTEN: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("cardvault_rows_written_total", "Card rows upserted")
        .expect("valid metric definition")
});

/// Batches committed by the import pipeline.
pub static BATCHES_COMMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cardvault_batches_committed_total",
        "Upsert transactions committed",
    )
    .expect("valid metric definition")
});

// =============================================================================
// Query engine
// =============================================================================

/// Queries by consumer and the tier that answered them.
pub static SEARCH_QUERIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cardvault_search_queries_total", "Catalog queries served"),
        &["consumer", "tier"], // consumer: "search", "identify"
    )
    .expect("valid metric definition")
});

/// Full-text index failures that fell back to a substring scan.
pub static INDEX_FALLBACKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cardvault_index_fallbacks_total",
            "Queries that fell back because the search index was unavailable",
        ),
        &["consumer"],
    )
    .expect("valid metric definition")
});

/// Write-through lookups by outcome.
pub static LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cardvault_lookups_total", "Card lookups by outcome"),
        &["result"], // "hit", "fetched", "not_catalogable", "not_found", "error"
    )
    .expect("valid metric definition")
});

// =============================================================================
// External requests
// =============================================================================

/// External request duration in seconds.
pub static EXTERNAL_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cardvault_external_request_duration_seconds",
            "Duration of requests to the card data source",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["operation"],
    )
    .expect("valid metric definition")
});

/// External requests by operation and status.
pub static EXTERNAL_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cardvault_external_requests_total",
            "Requests to the card data source",
        ),
        &["operation", "status"], // status: "success", "error"
    )
    .expect("valid metric definition")
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Import
        Box::new(IMPORT_RUNS.clone()),
        Box::new(IMPORT_DURATION.clone()),
        Box::new(RECORDS_SKIPPED.clone()),
        Box::new(ROWS_WRITTEN.clone()),
        Box::new(BATCHES_COMMITTED.clone()),
        // Query engine
        Box::new(SEARCH_QUERIES.clone()),
        Box::new(INDEX_FALLBACKS.clone()),
        Box::new(LOOKUPS.clone()),
        // External requests
        Box::new(EXTERNAL_REQUEST_DURATION.clone()),
        Box::new(EXTERNAL_REQUESTS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn test_all_metrics_register() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        SEARCH_QUERIES.with_label_values(&["search", "indexed"]).inc();
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"cardvault_search_queries_total".to_string()));
    }
}
