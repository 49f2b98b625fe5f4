//! Prometheus metrics
//!
//! One HTTP-level layer plus a `/metrics` scrape endpoint. Domain counters
//! (index write failures, gate outcomes) are emitted where they happen via
//! the `metrics` macros and surface through the same recorder.

use axum::{routing::get, Router};
use axum_prometheus::{PrometheusMetricLayer, PrometheusMetricLayerBuilder};

/// Build the request-metrics layer and the router serving `/metrics`.
pub fn setup_metrics() -> (PrometheusMetricLayer<'static>, Router) {
    let (layer, handle) = PrometheusMetricLayerBuilder::new()
        .with_prefix("inkpress")
        .with_default_metrics()
        .build_pair();

    let router = Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    );

    (layer, router)
}
