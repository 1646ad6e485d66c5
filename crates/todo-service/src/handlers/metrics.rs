//! Prometheus metrics endpoint.

use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

/// Render all recorded metrics in Prometheus text format.
///
/// The handle can only be created once per process, so this is covered by
/// the integration tests rather than a unit test.
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
