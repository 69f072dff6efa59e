//! Prometheus metrics definitions.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, HistogramVec,
    IntCounterVec, IntGauge,
};

/// Build cycles by strategy and outcome.
pub static BUILDS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "folio_builds_total",
        "Total number of build cycles",
        &["strategy", "outcome"]
    )
    .unwrap()
});

/// Build cycle duration.
pub static BUILD_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "folio_build_duration_seconds",
        "Build cycle duration in seconds",
        &["strategy"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap()
});

/// Artifacts written per emitter.
pub static EMITTED_FILES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "folio_emitted_files_total",
        "Total number of artifacts written",
        &["emitter"]
    )
    .unwrap()
});

/// Failed emitter runs per emitter.
pub static EMIT_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "folio_emit_failures_total",
        "Total number of failed emitter runs",
        &["emitter"]
    )
    .unwrap()
});

/// Content files currently in the store.
pub static CONTENT_FILES: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("folio_content_files", "Number of parsed content files").unwrap()
});

/// Initialize all metrics (call once at startup).
pub fn init_metrics() {
    // Access lazy statics to register them
    let _ = &*BUILDS_TOTAL;
    let _ = &*BUILD_DURATION;
    let _ = &*EMITTED_FILES;
    let _ = &*EMIT_FAILURES;
    let _ = &*CONTENT_FILES;

    tracing::debug!("Prometheus metrics initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_init() {
        init_metrics();

        let before = EMIT_FAILURES.with_label_values(&["Test"]).get();
        EMIT_FAILURES.with_label_values(&["Test"]).inc();
        assert_eq!(EMIT_FAILURES.with_label_values(&["Test"]).get(), before + 1);

        let names: Vec<String> = prometheus::gather()
            .iter()
            .map(|f| f.get_name().to_string())
            .collect();
        assert!(names.iter().any(|n| n == "folio_emit_failures_total"));
    }
}
