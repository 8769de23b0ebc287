//! Metrics module for payment-service.
//! Provides Prometheus metrics for provider calls and mandate setup.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter, register_int_counter_vec,
    Encoder, HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "payment_db_query_duration_seconds",
            "Database query duration"
        ),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Provider API calls by path, environment and status
pub static PROVIDER_CALLS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// One-shot sandbox/live fallbacks taken after a 403
pub static ENVIRONMENT_FALLBACKS_TOTAL: OnceLock<IntCounter> = OnceLock::new();

/// Mandate setups by outcome
pub static MANDATE_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Error counter for alerting
pub static ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    PROVIDER_CALLS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "payment_provider_calls_total",
                "Direct-debit provider calls by path, environment and status"
            ),
            &["path", "environment", "status"]
        )
        .expect("Failed to register PROVIDER_CALLS_TOTAL")
    });

    ENVIRONMENT_FALLBACKS_TOTAL.get_or_init(|| {
        register_int_counter!(opts!(
            "payment_environment_fallbacks_total",
            "Mandate sequences retried against the other environment after a 403"
        ))
        .expect("Failed to register ENVIRONMENT_FALLBACKS_TOTAL")
    });

    MANDATE_OPERATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "payment_mandate_operations_total",
                "Mandate setup operations by outcome"
            ),
            &["outcome"]
        )
        .expect("Failed to register MANDATE_OPERATIONS_TOTAL")
    });

    ERRORS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("payment_errors_total", "Total errors by type for alerting"),
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

/// Record a provider API call.
pub fn record_provider_call(path: &str, environment: &str, status: u16) {
    if let Some(counter) = PROVIDER_CALLS_TOTAL.get() {
        counter
            .with_label_values(&[path, environment, &status.to_string()])
            .inc();
    }
}

/// Record a 403-triggered environment fallback.
pub fn record_environment_fallback() {
    if let Some(counter) = ENVIRONMENT_FALLBACKS_TOTAL.get() {
        counter.inc();
    }
}

/// Record a mandate setup outcome.
pub fn record_mandate_operation(outcome: &str) {
    if let Some(counter) = MANDATE_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

/// Record an error for alerting.
pub fn record_error(error_type: &str, operation: &str) {
    if let Some(counter) = ERRORS_TOTAL.get() {
        counter.with_label_values(&[error_type, operation]).inc();
    }
}
