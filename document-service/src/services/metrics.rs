//! Metrics module for document-service.
//! Provides Prometheus metrics for database queries and PDF rendering.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram, register_histogram_vec, register_int_counter_vec,
    Encoder, Histogram, HistogramVec, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "document_db_query_duration_seconds",
            "Database query duration"
        ),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// PDF render duration histogram
pub static RENDER_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(histogram_opts!(
        "document_pdf_render_duration_seconds",
        "Offer PDF render duration"
    ))
    .expect("Failed to register RENDER_DURATION")
});

/// Rendered documents by outcome
pub static PDFS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Error counter for alerting
pub static ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    PDFS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("document_pdfs_total", "Rendered offer documents by outcome"),
            &["outcome"]
        )
        .expect("Failed to register PDFS_TOTAL")
    });

    ERRORS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("document_errors_total", "Total errors by type for alerting"),
            &["error_type", "operation"]
        )
        .expect("Failed to register ERRORS_TOTAL")
    });

    // Force initialization of lazy statics
    let _ = &*DB_QUERY_DURATION;
    let _ = &*RENDER_DURATION;
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

/// Record a rendered document outcome.
pub fn record_pdf(outcome: &str) {
    if let Some(counter) = PDFS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

/// Record an error for alerting.
pub fn record_error(error_type: &str, operation: &str) {
    if let Some(counter) = ERRORS_TOTAL.get() {
        counter.with_label_values(&[error_type, operation]).inc();
    }
}
