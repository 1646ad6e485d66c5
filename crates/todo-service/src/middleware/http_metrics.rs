//! HTTP metrics middleware.
//!
//! Applied as the outermost layer so that framework-level rejections (404,
//! 405, body limit) and 401s from the auth layer are recorded too.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::metrics::record_http_request;

/// Record method, normalized path, status and duration for every response.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    record_http_request(&method, &path, response.status().as_u16(), start.elapsed());

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn handler_500() -> (StatusCode, &'static str) {
        (StatusCode::INTERNAL_SERVER_ERROR, "Error")
    }

    fn test_app() -> Router {
        Router::new()
            .route("/list", get(|| async { "[]" }))
            .route("/list/:list_id", get(handler_500))
            .layer(middleware::from_fn(http_metrics_middleware))
    }

    async fn status_for(uri: &str) -> StatusCode {
        let request = HttpRequest::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        test_app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_middleware_passes_responses_through() {
        assert_eq!(status_for("/list").await, StatusCode::OK);
        assert_eq!(status_for("/list/7").await, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_for("/nonexistent").await, StatusCode::NOT_FOUND);
    }
}
