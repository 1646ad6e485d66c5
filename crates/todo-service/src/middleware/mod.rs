//! HTTP middleware for the Todo service.
//!
//! - `auth` - bearer token authentication for `/list` routes
//! - `http_metrics` - request metrics for every response

pub mod auth;
pub mod http_metrics;

pub use auth::{require_auth, AuthState};
pub use http_metrics::http_metrics_middleware;
