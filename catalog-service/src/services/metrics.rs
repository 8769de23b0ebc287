//! Metrics module for catalog-service.
//! Provides Prometheus metrics for catalog reads and API key auth.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "catalog_db_query_duration_seconds",
            "Database query duration"
        ),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Authenticated catalog requests (per-tenant metering)
pub static CATALOG_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// API key authentication failures
pub static AUTH_FAILURES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Error counter for alerting
pub static ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    CATALOG_REQUESTS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "catalog_requests_total",
                "Authenticated catalog requests by tenant"
            ),
            &["company_id"]
        )
        .expect("Failed to register CATALOG_REQUESTS_TOTAL")
    });

    AUTH_FAILURES_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "catalog_auth_failures_total",
                "API key authentication failures by reason"
            ),
            &["reason"]
        )
        .expect("Failed to register AUTH_FAILURES_TOTAL")
    });

    ERRORS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("catalog_errors_total", "Total errors by type for alerting"),
            &["error_type", "operation"]
        )
        .expect("Failed to register ERRORS_TOTAL")
    });

    // Force initialization of lazy statics
    let _ = &*DB_QUERY_DURATION;
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Failed to convert metrics to string")
}

/// Record an authenticated catalog request.
pub fn record_catalog_request(company_id: &str) {
    if let Some(counter) = CATALOG_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[company_id]).inc();
    }
}

/// Record an API key authentication failure.
pub fn record_auth_failure(reason: &str) {
    if let Some(counter) = AUTH_FAILURES_TOTAL.get() {
        counter.with_label_values(&[reason]).inc();
    }
}

/// Record an error for alerting.
pub fn record_error(error_type: &str, operation: &str) {
    if let Some(counter) = ERRORS_TOTAL.get() {
        counter.with_label_values(&[error_type, operation]).inc();
    }
}
