//! HTTP routes for the Todo service.
//!
//! Defines the Axum router and application state.

use crate::auth::{JwksClient, JwtValidator};
use crate::config::Config;
use crate::handlers::{self, items, lists};
use crate::middleware::{http_metrics_middleware, require_auth, AuthState};
use axum::{
    middleware,
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Per-request timeout.
const REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: PgPool,

    /// Service configuration.
    pub config: Config,

    /// Key cache shared by the validator and the background refresh task.
    pub jwks_client: Arc<JwksClient>,
}

/// Build the application routes.
///
/// - `/health`, `/ready`, `/metrics` - public operational endpoints
/// - `/list/...` - list and item CRUD, bearer token required
///
/// Global layers, innermost first: panic catcher, timeout, request tracing,
/// HTTP metrics.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let jwt_validator = Arc::new(JwtValidator::new(
        Arc::clone(&state.jwks_client),
        state.config.issuer_url.clone(),
        state.config.audience.clone(),
        state.config.jwt_clock_skew_seconds,
    ));
    let auth_state = Arc::new(AuthState { jwt_validator });

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .with_state(Arc::clone(&state));

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let protected_routes = Router::new()
        .route("/list", get(lists::list_lists).post(lists::create_list))
        .route(
            "/list/:list_id",
            get(lists::get_list)
                .put(lists::replace_list)
                .patch(lists::update_list)
                .delete(lists::delete_list),
        )
        .route(
            "/list/:list_id/item",
            get(items::list_items).post(items::create_item),
        )
        .route(
            "/list/:list_id/item/:item_id",
            get(items::get_item)
                .put(items::replace_item)
                .patch(items::update_item)
                .delete(items::delete_item),
        )
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth))
        .with_state(state);

    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECONDS)))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(http_metrics_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }
}
