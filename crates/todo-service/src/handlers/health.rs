//! Health check handlers.
//!
//! - `/health`: liveness, returns "OK" while the process is serving
//! - `/ready`: readiness, checks database connectivity

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Liveness probe handler. Checks no dependencies.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Returns 200 when the database answers, 503 otherwise. The error message is
/// generic; the actual failure is logged.
#[tracing::instrument(skip_all, name = "todo.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if let Err(e) = sqlx::query("SELECT 1").execute(&state.pool).await {
        tracing::warn!(target: "todo.health", error = %e, "Readiness check failed: database error");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready",
                database: "unhealthy",
                error: Some("Service dependencies unavailable".to_string()),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(ReadinessResponse {
            status: "ready",
            database: "healthy",
            error: None,
        }),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        assert_eq!(health_check().await, "OK");
    }

    #[test]
    fn test_readiness_response_serialization() {
        let ready = ReadinessResponse {
            status: "ready",
            database: "healthy",
            error: None,
        };

        let json = serde_json::to_string(&ready).unwrap();
        assert!(json.contains("\"status\":\"ready\""));
        assert!(!json.contains("\"error\""));

        let not_ready = ReadinessResponse {
            status: "not_ready",
            database: "unhealthy",
            error: Some("Service dependencies unavailable".to_string()),
        };

        let json = serde_json::to_string(&not_ready).unwrap();
        assert!(json.contains("\"database\":\"unhealthy\""));
        assert!(json.contains("Service dependencies unavailable"));
    }
}
