//! HTTP request handlers for the Todo service.

pub mod health;
pub mod items;
pub mod lists;
pub mod metrics;

pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;

use crate::errors::ApiError;
use axum::extract::rejection::PathRejection;
use axum::extract::Path;
use serde::de::DeserializeOwned;

/// Deserialize a JSON body, mapping failures to 400 instead of axum's 422.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(target: "todo.handlers", error = %e, "Invalid request body");
        ApiError::BadRequest(format!("Invalid request body: {e}"))
    })
}

/// Deserialize a PATCH body. An empty body supplies no fields.
fn parse_patch_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    parse_body(body)
}

/// Unwrap path parameters, mapping a non-numeric id to 400.
fn path_params<T>(path: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    match path {
        Ok(Path(params)) => Ok(params),
        Err(rejection) => {
            tracing::debug!(target: "todo.handlers", error = %rejection, "Invalid path parameters");
            Err(ApiError::BadRequest(rejection.body_text()))
        }
    }
}
