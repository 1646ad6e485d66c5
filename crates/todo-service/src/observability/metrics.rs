//! Metrics definitions for the Todo service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `todo_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: HTTP methods
//! - `endpoint`: parameterized route templates (ids replaced by `{id}`)
//! - `status`: success, error, timeout
//! - `operation`: bounded by repository code (`list_find_all`, `item_create`, ...)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus recorder and return the handle used by the
/// `/metrics` endpoint.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("todo_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("todo_db_query".to_string()),
            &[
                0.001, 0.002, 0.005, 0.010, 0.020, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set DB query buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion.
///
/// Metric: `todo_http_requests_total`, `todo_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status` / `status_code`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("todo_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("todo_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize a request path to its route template.
///
/// `/list/42/item/7` becomes `/list/{id}/item/{id}`. Anything that does not
/// match a known route collapses to `/other`.
fn normalize_endpoint(path: &str) -> String {
    match path {
        "/health" | "/ready" | "/metrics" | "/list" => return path.to_string(),
        _ => {}
    }

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    let normalized = match segments.as_slice() {
        ["list", _] => "/list/{id}",
        ["list", _, "item"] => "/list/{id}/item",
        ["list", _, "item", _] => "/list/{id}/item/{id}",
        _ => "/other",
    };

    normalized.to_string()
}

// ============================================================================
// Database Metrics
// ============================================================================

/// Record a repository query.
///
/// Metric: `todo_db_query_duration_seconds`, `todo_db_queries_total`
/// Labels: `operation`, `status`
pub fn record_db_query(operation: &str, status: &str, duration: Duration) {
    histogram!("todo_db_query_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("todo_db_queries_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Key Cache Metrics
// ============================================================================

/// Record a JWKS fetch attempt.
///
/// Metric: `todo_jwks_refresh_total`
/// Labels: `status` (success, error)
pub fn record_jwks_refresh(status: &str) {
    counter!("todo_jwks_refresh_total",
        "status" => status.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    // Tests without a local recorder run against the global no-op recorder.

    fn counter_value(
        snapshot: &[(
            metrics_util::CompositeKey,
            Option<::metrics::Unit>,
            Option<::metrics::SharedString>,
            DebugValue,
        )],
        name: &str,
        label: (&str, &str),
    ) -> Option<u64> {
        snapshot.iter().find_map(|(key, _, _, value)| {
            let key = key.key();
            let matches = key.name() == name
                && key
                    .labels()
                    .any(|l| l.key() == label.0 && l.value() == label.1);
            match value {
                DebugValue::Counter(count) if matches => Some(*count),
                _ => None,
            }
        })
    }

    #[test]
    fn test_jwks_refresh_counted_by_status() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        ::metrics::with_local_recorder(&recorder, || {
            record_jwks_refresh("success");
            record_jwks_refresh("success");
            record_jwks_refresh("error");
        });

        let snapshot = snapshotter.snapshot().into_vec();
        assert_eq!(
            counter_value(&snapshot, "todo_jwks_refresh_total", ("status", "success")),
            Some(2)
        );
        assert_eq!(
            counter_value(&snapshot, "todo_jwks_refresh_total", ("status", "error")),
            Some(1)
        );
    }

    #[test]
    fn test_http_request_uses_normalized_endpoint() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        ::metrics::with_local_recorder(&recorder, || {
            record_http_request("GET", "/list/1", 200, Duration::from_millis(1));
            record_http_request("GET", "/list/2", 200, Duration::from_millis(1));
        });

        let snapshot = snapshotter.snapshot().into_vec();
        assert_eq!(
            counter_value(&snapshot, "todo_http_requests_total", ("endpoint", "/list/{id}")),
            Some(2)
        );
        assert_eq!(
            counter_value(&snapshot, "todo_http_requests_total", ("endpoint", "/list/1")),
            None
        );
    }

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/health", 200, Duration::from_millis(5));
        record_http_request("GET", "/list/12", 404, Duration::from_millis(8));
        record_http_request("PATCH", "/list/12/item/3", 200, Duration::from_millis(20));
    }

    #[test]
    fn test_record_db_query() {
        record_db_query("list_find_all", "success", Duration::from_millis(3));
        record_db_query("item_create", "error", Duration::from_millis(40));
    }

    #[test]
    fn test_record_jwks_refresh() {
        record_jwks_refresh("success");
        record_jwks_refresh("error");
    }

    #[test]
    fn test_categorize_status_code() {
        assert_eq!(categorize_status_code(200), "success");
        assert_eq!(categorize_status_code(204), "success");
        assert_eq!(categorize_status_code(401), "error");
        assert_eq!(categorize_status_code(504), "timeout");
        assert_eq!(categorize_status_code(408), "timeout");
    }

    #[test]
    fn test_normalize_endpoint_static_paths() {
        assert_eq!(normalize_endpoint("/health"), "/health");
        assert_eq!(normalize_endpoint("/ready"), "/ready");
        assert_eq!(normalize_endpoint("/metrics"), "/metrics");
        assert_eq!(normalize_endpoint("/list"), "/list");
    }

    #[test]
    fn test_normalize_endpoint_replaces_ids() {
        assert_eq!(normalize_endpoint("/list/42"), "/list/{id}");
        assert_eq!(normalize_endpoint("/list/42/item"), "/list/{id}/item");
        assert_eq!(normalize_endpoint("/list/42/item/7"), "/list/{id}/item/{id}");
    }

    #[test]
    fn test_normalize_endpoint_unknown_paths() {
        assert_eq!(normalize_endpoint("/"), "/other");
        assert_eq!(normalize_endpoint("/admin"), "/other");
        assert_eq!(normalize_endpoint("/list/1/item/2/extra"), "/other");
    }
}
