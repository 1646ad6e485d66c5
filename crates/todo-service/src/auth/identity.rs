//! Caller identity.
//!
//! The authenticated caller is the `sub` claim of a validated token. Handlers
//! receive it through the `Identity` extractor; every data query is scoped by
//! it.

use crate::auth::claims::Claims;
use crate::errors::ApiError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::fmt;

/// The authenticated caller's subject identifier.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity(String);

impl Identity {
    pub fn from_claims(claims: &Claims) -> Self {
        Self(claims.sub.clone())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Identity").field(&"[REDACTED]").finish()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Claims are only absent if a protected route was mounted without the
        // auth layer.
        parts
            .extensions
            .get::<Claims>()
            .map(Identity::from_claims)
            .ok_or_else(|| ApiError::Internal("Identity requested without claims".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::claims::Audience;
    use axum::http::Request;

    fn claims(sub: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            iss: "https://tenant.example.com/".to_string(),
            aud: Audience::Single("todo-api".to_string()),
            exp: 1_900_000_000,
            iat: None,
            nbf: None,
            scope: None,
        }
    }

    #[tokio::test]
    async fn test_extracts_sub_from_claims() {
        let mut request = Request::builder().body(()).unwrap();
        request.extensions_mut().insert(claims("auth0|alice"));
        let (mut parts, _) = request.into_parts();

        let identity = Identity::from_request_parts(&mut parts, &()).await.unwrap();

        assert_eq!(identity.as_str(), "auth0|alice");
    }

    #[tokio::test]
    async fn test_missing_claims_is_internal_error() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();

        let result = Identity::from_request_parts(&mut parts, &()).await;

        assert!(matches!(result, Err(ApiError::Internal(_))));
    }

    #[test]
    fn test_debug_redacts_subject() {
        let identity = Identity::from_claims(&claims("auth0|alice"));
        let debug_str = format!("{:?}", identity);
        assert!(!debug_str.contains("alice"));
    }
}
