//! Authentication middleware for protected routes.
//!
//! Extracts the bearer token from the `Authorization` header, validates it
//! and stores the validated `Claims` in the request extensions, where the
//! `Identity` extractor picks them up.

use crate::auth::JwtValidator;
use crate::errors::ApiError;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::IntoResponse,
};
use common::jwt::parse_bearer_token;
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub jwt_validator: Arc<JwtValidator>,
}

fn extract_bearer_token(req: &Request) -> Result<&str, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "todo.middleware.auth", "Missing Authorization header");
            ApiError::Unauthenticated
        })?;

    parse_bearer_token(auth_header).ok_or_else(|| {
        tracing::debug!(target: "todo.middleware.auth", "Invalid Authorization header format");
        ApiError::Unauthenticated
    })
}

/// Require a valid bearer token.
///
/// # Response
///
/// - 401 if the token is missing or invalid; the handler never runs
/// - Otherwise continues with `Claims` in the request extensions
#[instrument(skip_all, name = "todo.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_bearer_token(&req)?;

    let claims = state.jwt_validator.validate(token).await?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::JwksClient;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request_with_auth(value: Option<&str>) -> Request {
        let mut builder = HttpRequest::builder().uri("/protected");
        if let Some(value) = value {
            builder = builder.header("authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_extract_bearer_token_valid() {
        let req = request_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer_token(&req).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_extract_bearer_token_missing_header() {
        let req = request_with_auth(None);
        assert!(matches!(
            extract_bearer_token(&req),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[test]
    fn test_extract_bearer_token_wrong_scheme() {
        let req = request_with_auth(Some("Basic dXNlcjpwYXNz"));
        assert!(matches!(
            extract_bearer_token(&req),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[test]
    fn test_extract_bearer_token_empty_token() {
        let req = request_with_auth(Some("Bearer "));
        assert!(matches!(
            extract_bearer_token(&req),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_invalid_token_never_reaches_handler() {
        let jwks_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"keys": []})))
            .expect(0)
            .mount(&jwks_server)
            .await;

        let validator = JwtValidator::new(
            Arc::new(JwksClient::new(format!(
                "{}/.well-known/jwks.json",
                jwks_server.uri()
            ))),
            format!("{}/", jwks_server.uri()),
            "todo-api".to_string(),
            60,
        );
        let state = Arc::new(AuthState {
            jwt_validator: Arc::new(validator),
        });

        let app = Router::new()
            .route("/protected", get(|| async { StatusCode::OK }))
            .route_layer(middleware::from_fn_with_state(state, require_auth));

        let response = app
            .oneshot(request_with_auth(Some("Bearer not-a-jwt")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("www-authenticate"));
        jwks_server.verify().await;
    }
}
