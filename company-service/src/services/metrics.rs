//! Metrics module for company-service.
//! Provides Prometheus metrics for company registry operations.

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
            "company_db_query_duration_seconds",
            "Database query duration"
        ),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Company registry operations counter
pub static COMPANY_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Subscription status reads, labelled by derived status
pub static SUBSCRIPTION_READS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// API key operations counter
pub static API_KEY_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Error counter for alerting
pub static ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    COMPANY_OPERATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "company_operations_total",
                "Total company registry operations by operation type"
            ),
            &["operation"]
        )
        .expect("Failed to register COMPANY_OPERATIONS_TOTAL")
    });

    SUBSCRIPTION_READS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "company_subscription_reads_total",
                "Subscription status reads by derived status"
            ),
            &["status"]
        )
        .expect("Failed to register SUBSCRIPTION_READS_TOTAL")
    });

    API_KEY_OPERATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "company_api_key_operations_total",
                "Catalog API key operations by operation type"
            ),
            &["operation"]
        )
        .expect("Failed to register API_KEY_OPERATIONS_TOTAL")
    });

    ERRORS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("company_errors_total", "Total errors by type for alerting"),
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

/// Record a company registry operation.
pub fn record_company_operation(operation: &str) {
    if let Some(counter) = COMPANY_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[operation]).inc();
    }
}

/// Record a subscription status read.
pub fn record_subscription_read(status: &str) {
    if let Some(counter) = SUBSCRIPTION_READS_TOTAL.get() {
        counter.with_label_values(&[status]).inc();
    }
}

/// Record an API key operation.
pub fn record_api_key_operation(operation: &str) {
    if let Some(counter) = API_KEY_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[operation]).inc();
    }
}

/// Record an error for alerting.
pub fn record_error(error_type: &str, operation: &str) {
    if let Some(counter) = ERRORS_TOTAL.get() {
        counter.with_label_values(&[error_type, operation]).inc();
    }
}
