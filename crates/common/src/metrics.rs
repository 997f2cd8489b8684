use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static CACHE_HITS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "catalog_cache_hits_total",
        "Collection snapshots served from the tagged cache",
        &["key"]
    )
    .expect("register cache_hits_total")
});

pub static CACHE_MISSES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "catalog_cache_misses_total",
        "Collection snapshots recomputed by their producer",
        &["key"]
    )
    .expect("register cache_misses_total")
});

pub static CACHE_INVALIDATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "catalog_cache_invalidations_total",
        "Tag invalidations applied to the tagged cache",
        &["tag"]
    )
    .expect("register cache_invalidations_total")
});

pub fn record_hit(key: &str) {
    CACHE_HITS_TOTAL.with_label_values(&[key]).inc();
}

pub fn record_miss(key: &str) {
    CACHE_MISSES_TOTAL.with_label_values(&[key]).inc();
}

pub fn record_invalidation(tag: &str) {
    CACHE_INVALIDATIONS_TOTAL.with_label_values(&[tag]).inc();
}

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
