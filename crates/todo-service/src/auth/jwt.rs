//! JWT validation for the Todo service.
//!
//! Validates incoming access tokens using public keys fetched from the
//! issuer's JWKS endpoint.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only RS256 is accepted; the header `alg` must match
//! - `iss`, `aud`, `exp` and `nbf` are validated, with configurable leeway
//! - Every failure collapses into one `Unauthenticated` error so callers
//!   cannot probe which check failed

use crate::auth::claims::Claims;
use crate::auth::jwks::{Jwk, JwksClient};
use crate::errors::ApiError;
use common::jwt::extract_kid;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use tracing::instrument;

/// The only signing algorithm accepted.
pub const EXPECTED_ALGORITHM: Algorithm = Algorithm::RS256;

/// JWT validator using JWKS from the issuer.
pub struct JwtValidator {
    jwks_client: Arc<JwksClient>,

    /// Expected `iss` claim.
    issuer: String,

    /// Audience that must be present in `aud`.
    audience: String,

    /// Leeway in seconds for `exp`/`nbf`.
    clock_skew_seconds: u64,
}

impl JwtValidator {
    pub fn new(
        jwks_client: Arc<JwksClient>,
        issuer: String,
        audience: String,
        clock_skew_seconds: u64,
    ) -> Self {
        Self {
            jwks_client,
            issuer,
            audience,
            clock_skew_seconds,
        }
    }

    /// Validate a JWT and return the claims.
    ///
    /// # Security Checks
    ///
    /// 1. Size check and `kid` extraction from the header
    /// 2. Public key lookup in the JWKS cache
    /// 3. RS256 signature verification
    /// 4. `iss`, `aud`, `exp`, `nbf` validation
    /// 5. Non-empty `sub`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthenticated` for every validation failure.
    #[instrument(skip_all, name = "todo.auth.validate")]
    pub async fn validate(&self, token: &str) -> Result<Claims, ApiError> {
        let kid = extract_kid(token).map_err(|e| {
            tracing::debug!(target: "todo.auth.jwt", error = ?e, "Token kid extraction failed");
            ApiError::Unauthenticated
        })?;

        let jwk = self.jwks_client.get_key(&kid).await?;

        let claims = verify_token(token, &jwk, &self.validation())?;

        if claims.sub.trim().is_empty() {
            tracing::debug!(target: "todo.auth.jwt", "Token has empty sub claim");
            return Err(ApiError::Unauthenticated);
        }

        tracing::debug!(target: "todo.auth.jwt", "Token validated successfully");
        Ok(claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(EXPECTED_ALGORITHM);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = self.clock_skew_seconds;
        validation
    }
}

/// Verify the signature with `jwk` and decode the claims.
fn verify_token(token: &str, jwk: &Jwk, validation: &Validation) -> Result<Claims, ApiError> {
    if jwk.kty != "RSA" {
        tracing::warn!(target: "todo.auth.jwt", kty = %jwk.kty, "Unexpected JWK key type");
        return Err(ApiError::Unauthenticated);
    }
    if let Some(alg) = &jwk.alg {
        if alg != "RS256" {
            tracing::warn!(target: "todo.auth.jwt", alg = %alg, "Unexpected JWK algorithm");
            return Err(ApiError::Unauthenticated);
        }
    }
    if let Some(key_use) = &jwk.key_use {
        if key_use != "sig" {
            tracing::warn!(target: "todo.auth.jwt", key_use = %key_use, "JWK is not a signing key");
            return Err(ApiError::Unauthenticated);
        }
    }

    let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
        tracing::error!(target: "todo.auth.jwt", kid = ?jwk.kid, "JWK missing RSA components");
        return Err(ApiError::Unauthenticated);
    };

    let decoding_key = DecodingKey::from_rsa_components(n, e).map_err(|e| {
        tracing::error!(target: "todo.auth.jwt", error = %e, "Invalid RSA public key encoding");
        ApiError::Unauthenticated
    })?;

    let token_data = decode::<Claims>(token, &decoding_key, validation).map_err(|e| {
        tracing::debug!(target: "todo.auth.jwt", error = %e, "Token verification failed");
        ApiError::Unauthenticated
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    fn encode_segment(input: &[u8]) -> String {
        URL_SAFE_NO_PAD.encode(input)
    }

    fn forged_token() -> String {
        let header = encode_segment(br#"{"alg":"RS256","typ":"JWT","kid":"test-key"}"#);
        let payload = encode_segment(
            br#"{"sub":"user","iss":"https://tenant.example.com/","aud":"todo-api","exp":9999999999}"#,
        );
        format!("{}.{}.fake_signature", header, payload)
    }

    fn rsa_jwk() -> Jwk {
        Jwk {
            kty: "RSA".to_string(),
            kid: Some("test-key".to_string()),
            n: Some("sXchDaQebHnPiGvyDOAT4saGEUetSyo9MKLOoWFsueri23bOdgWp4Dy1Wl".to_string()),
            e: Some("AQAB".to_string()),
            alg: Some("RS256".to_string()),
            key_use: Some("sig".to_string()),
        }
    }

    fn validator() -> JwtValidator {
        JwtValidator::new(
            Arc::new(JwksClient::new(
                "http://localhost:1/.well-known/jwks.json".to_string(),
            )),
            "https://tenant.example.com/".to_string(),
            "todo-api".to_string(),
            60,
        )
    }

    #[test]
    fn test_verify_token_rejects_non_rsa_key_type() {
        let jwk = Jwk {
            kty: "OKP".to_string(),
            ..rsa_jwk()
        };

        let result = verify_token(&forged_token(), &jwk, &validator().validation());
        assert!(matches!(result, Err(ApiError::Unauthenticated)));
    }

    #[test]
    fn test_verify_token_rejects_non_rs256_jwk() {
        let jwk = Jwk {
            alg: Some("RS512".to_string()),
            ..rsa_jwk()
        };

        let result = verify_token(&forged_token(), &jwk, &validator().validation());
        assert!(matches!(result, Err(ApiError::Unauthenticated)));
    }

    #[test]
    fn test_verify_token_rejects_encryption_key() {
        let jwk = Jwk {
            key_use: Some("enc".to_string()),
            ..rsa_jwk()
        };

        let result = verify_token(&forged_token(), &jwk, &validator().validation());
        assert!(matches!(result, Err(ApiError::Unauthenticated)));
    }

    #[test]
    fn test_verify_token_rejects_missing_modulus() {
        let jwk = Jwk {
            n: None,
            ..rsa_jwk()
        };

        let result = verify_token(&forged_token(), &jwk, &validator().validation());
        assert!(matches!(result, Err(ApiError::Unauthenticated)));
    }

    #[test]
    fn test_verify_token_rejects_bad_signature() {
        let result = verify_token(&forged_token(), &rsa_jwk(), &validator().validation());
        assert!(matches!(result, Err(ApiError::Unauthenticated)));
    }

    #[test]
    fn test_validation_is_configured() {
        let validation = validator().validation();

        assert_eq!(validation.algorithms, vec![Algorithm::RS256]);
        assert_eq!(validation.leeway, 60);
        assert!(validation.validate_exp);
        assert!(validation.validate_nbf);
        assert!(validation
            .iss
            .as_ref()
            .is_some_and(|iss| iss.contains("https://tenant.example.com/")));
        assert!(validation
            .aud
            .as_ref()
            .is_some_and(|aud| aud.contains("todo-api")));
    }

    #[tokio::test]
    async fn test_validate_rejects_garbage_before_key_lookup() {
        // The JWKS URL is unreachable; a malformed token must fail before any fetch.
        let result = validator().validate("garbage").await;
        assert!(matches!(result, Err(ApiError::Unauthenticated)));
    }
}
