//! Metrics module for offer-service.
//! Provides Prometheus metrics for offer operations and per-tenant metering.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!("offer_db_query_duration_seconds", "Database query duration"),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Offer operations counter (per-tenant metering)
pub static OFFER_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Contract operations counter (per-tenant metering)
pub static CONTRACT_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Equipment assignment counter
pub static ASSIGNMENT_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Wizard submissions counter (per-tenant metering)
pub static WIZARD_SUBMISSIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Error counter for alerting
pub static ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    OFFER_OPERATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "offer_operations_total",
                "Total offer operations by tenant and operation type"
            ),
            &["company_id", "operation"]
        )
        .expect("Failed to register OFFER_OPERATIONS_TOTAL")
    });

    CONTRACT_OPERATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "offer_contract_operations_total",
                "Total contract operations by tenant and operation type"
            ),
            &["company_id", "operation"]
        )
        .expect("Failed to register CONTRACT_OPERATIONS_TOTAL")
    });

    ASSIGNMENT_OPERATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "offer_assignment_operations_total",
                "Total equipment assignment operations by parent type"
            ),
            &["parent_type", "operation"]
        )
        .expect("Failed to register ASSIGNMENT_OPERATIONS_TOTAL")
    });

    WIZARD_SUBMISSIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "offer_wizard_submissions_total",
                "Total wizard submissions by tenant and result"
            ),
            &["company_id", "result"]
        )
        .expect("Failed to register WIZARD_SUBMISSIONS_TOTAL")
    });

    ERRORS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("offer_errors_total", "Total errors by type for alerting"),
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

/// Record an offer operation.
pub fn record_offer_operation(company_id: &str, operation: &str) {
    if let Some(counter) = OFFER_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[company_id, operation]).inc();
    }
}

/// Record a contract operation.
pub fn record_contract_operation(company_id: &str, operation: &str) {
    if let Some(counter) = CONTRACT_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[company_id, operation]).inc();
    }
}

/// Record an equipment assignment operation.
pub fn record_assignment_operation(parent_type: &str, operation: &str) {
    if let Some(counter) = ASSIGNMENT_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[parent_type, operation]).inc();
    }
}

/// Record a wizard submission.
pub fn record_wizard_submission(company_id: &str, result: &str) {
    if let Some(counter) = WIZARD_SUBMISSIONS_TOTAL.get() {
        counter.with_label_values(&[company_id, result]).inc();
    }
}

/// Record an error for alerting.
pub fn record_error(error_type: &str, operation: &str) {
    if let Some(counter) = ERRORS_TOTAL.get() {
        counter.with_label_values(&[error_type, operation]).inc();
    }
}
