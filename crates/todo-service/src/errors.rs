//! Todo service error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl.
//! Messages returned to clients are generic where they could leak internal
//! details or resource existence. Actual errors are logged server-side.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Message returned for every authentication failure.
///
/// One message for all causes so a caller cannot tell which check failed.
pub const UNAUTHENTICATED_MESSAGE: &str = "The access token is invalid or expired";

/// Message returned for every ownership/identifier miss.
pub const NOT_FOUND_MESSAGE: &str = "Not found";

/// Todo service error type.
///
/// Maps to HTTP status codes:
/// - Unauthenticated: 401 Unauthorized
/// - BadRequest: 400 Bad Request
/// - NotFound: 404 Not Found
/// - Database, Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message) = match self {
            ApiError::Unauthenticated => ("UNAUTHENTICATED", UNAUTHENTICATED_MESSAGE.to_string()),
            ApiError::BadRequest(detail) => ("BAD_REQUEST", detail),
            ApiError::NotFound => ("NOT_FOUND", NOT_FOUND_MESSAGE.to_string()),
            ApiError::Database(err) => {
                tracing::error!(target: "todo.database", error = %err, "Database operation failed");
                ("INTERNAL_ERROR", "An internal error occurred".to_string())
            }
            ApiError::Internal(reason) => {
                tracing::error!(target: "todo.internal", reason = %reason, "Internal error");
                ("INTERNAL_ERROR", "An internal error occurred".to_string())
            }
        };

        let mut response = (
            status,
            Json(ErrorResponse {
                error: ErrorDetail { code, message },
            }),
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"todo-api\", error=\"invalid_token\""),
            );
        }

        response
    }
}

/// Convert sqlx errors to ApiError.
///
/// `RowNotFound` is the only "expected" miss; everything else is a 500.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            other => ApiError::Database(other.to_string()),
        }
    }
}
