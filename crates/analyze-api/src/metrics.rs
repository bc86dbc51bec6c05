// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Provides global metrics using the default Prometheus registry via macros and
//! an Axum-compatible metrics handler.

use std::sync::LazyLock;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, TextEncoder, register_histogram_vec,
    register_int_counter, register_int_counter_vec,
};
use tracing::error;

const DURATION_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Total number of analyze requests, labeled by outcome.
pub static ANALYZE_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "wallet_analyze_requests_total",
        "Total number of analyze requests, labeled by outcome",
        &["outcome"]
    )
    .expect("Failed to create wallet_analyze_requests_total counter vec")
});

/// Histogram for transaction provider request durations in seconds.
pub static PROVIDER_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "wallet_analyze_provider_request_duration",
        "Transaction provider request durations in seconds",
        &["provider", "result"],
        DURATION_BUCKETS.to_vec()
    )
    .expect("Failed to create provider request duration histogram")
});

/// Histogram for scoring service request durations in seconds.
pub static SCORING_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "wallet_analyze_scoring_request_duration",
        "Scoring service request durations in seconds",
        &["result"],
        DURATION_BUCKETS.to_vec()
    )
    .expect("Failed to create scoring request duration histogram")
});

/// Number of responses that carried the scoring failure placeholder.
pub static ENRICHMENT_FALLBACKS: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "wallet_analyze_enrichment_fallbacks_total",
        "Total number of analyze responses served with the scoring failure placeholder"
    )
    .expect("Failed to create enrichment fallback counter")
});

/// Increment the analyze request counter
///
/// # Arguments
/// * `outcome` - `success`, `invalid_request`, or `upstream_error`
pub fn inc_analyze_requests(outcome: &str) {
    ANALYZE_REQUESTS.with_label_values(&[outcome]).inc();
}

/// Observe the duration of a transaction provider request
///
/// # Arguments
/// * `provider` - The name of the provider
/// * `result` - `ok` or `error`
/// * `duration_secs` - The duration of the request in seconds
pub fn observe_provider_duration(provider: &str, result: &str, duration_secs: f64) {
    PROVIDER_REQUEST_DURATION
        .with_label_values(&[provider, result])
        .observe(duration_secs);
}

/// Observe the duration of a scoring request
pub fn observe_scoring_duration(result: &str, duration_secs: f64) {
    SCORING_REQUEST_DURATION
        .with_label_values(&[result])
        .observe(duration_secs);
}

/// Count a response served with the scoring failure placeholder
pub fn inc_enrichment_fallbacks() {
    ENRICHMENT_FALLBACKS.inc();
}

/// Axum handler that exports metrics in Prometheus text format
pub async fn metrics_handler() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("failed to encode metrics: {e}");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    #[tokio::test]
    async fn exports_registered_metrics() {
        inc_analyze_requests("success");
        observe_provider_duration("moralis", "ok", 0.2);
        observe_scoring_duration("error", 0.1);
        inc_enrichment_fallbacks();

        let response = metrics_handler().await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("metrics body");
        let text = String::from_utf8(bytes.to_vec()).expect("utf-8 metrics");
        assert!(text.contains("wallet_analyze_requests_total"));
        assert!(text.contains("wallet_analyze_provider_request_duration"));
        assert!(text.contains("wallet_analyze_scoring_request_duration"));
        assert!(text.contains("wallet_analyze_enrichment_fallbacks_total"));
    }
}
