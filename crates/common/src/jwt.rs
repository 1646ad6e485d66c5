//! JWT utilities shared by the token validator and the test harness.
//!
//! This module provides the pieces of token handling that happen BEFORE any
//! cryptographic work:
//! - Size limits for DoS prevention
//! - Clock skew constants for `exp`/`nbf` leeway
//! - Bearer scheme parsing for the `Authorization` header
//! - Key ID extraction from JWT headers
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Nothing in this module verifies a signature; callers MUST still verify
//!   the token against a trusted key after looking it up by `kid`
//! - All error variants share one generic message to prevent information
//!   leakage; details are logged at debug level

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Typical access tokens are well under 2KB. Anything larger is rejected
/// before base64 decoding or signature verification.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Default leeway applied to `exp` and `nbf` checks.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(60);

/// Maximum configurable leeway (10 minutes).
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// Authentication scheme accepted in the `Authorization` header.
pub const BEARER_SCHEME: &str = "Bearer";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while inspecting a JWT before verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token is not a three-part compact JWS.
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Token header has no usable `kid`.
    #[error("The access token is invalid or expired")]
    MissingKid,
}

// =============================================================================
// Functions
// =============================================================================

/// Extract the token from an `Authorization` header value.
///
/// The scheme name is matched case-insensitively (RFC 7235 section 2.1).
/// Returns `None` when the scheme is not `Bearer` or the token is empty.
#[must_use]
pub fn parse_bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Extract the `kid` (key ID) from a JWT header without verifying the signature.
///
/// # Errors
///
/// - `TokenTooLarge` - token exceeds [`MAX_JWT_SIZE_BYTES`]
/// - `MalformedToken` - wrong structure, bad base64 or invalid JSON header
/// - `MissingKid` - header has no `kid`, or it is not a non-empty string
pub fn extract_kid(token: &str) -> Result<String, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let mut parts = token.split('.');
    let (Some(header_part), Some(_), Some(_), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        tracing::debug!(target: "common.jwt", "Token rejected: invalid JWT format");
        return Err(JwtValidationError::MalformedToken);
    };

    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MissingKid)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn token_with_header(header: &str) -> String {
        format!("{}.payload.signature", URL_SAFE_NO_PAD.encode(header.as_bytes()))
    }

    #[test]
    fn test_parse_bearer_token() {
        assert_eq!(parse_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(parse_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(parse_bearer_token("BEARER abc "), Some("abc"));
    }

    #[test]
    fn test_parse_bearer_token_rejects_other_schemes() {
        assert_eq!(parse_bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(parse_bearer_token("Bearer"), None);
        assert_eq!(parse_bearer_token("Bearer    "), None);
        assert_eq!(parse_bearer_token(""), None);
    }

    #[test]
    fn test_extract_kid_valid_token() {
        let token = token_with_header(r#"{"alg":"RS256","typ":"JWT","kid":"key-01"}"#);
        assert_eq!(extract_kid(&token).unwrap(), "key-01");
    }

    #[test]
    fn test_extract_kid_missing_kid() {
        let token = token_with_header(r#"{"alg":"RS256","typ":"JWT"}"#);
        assert_eq!(extract_kid(&token), Err(JwtValidationError::MissingKid));
    }

    #[test]
    fn test_extract_kid_rejects_non_string_and_empty_kid() {
        for header in [
            r#"{"alg":"RS256","kid":12345}"#,
            r#"{"alg":"RS256","kid":null}"#,
            r#"{"alg":"RS256","kid":""}"#,
        ] {
            assert_eq!(
                extract_kid(&token_with_header(header)),
                Err(JwtValidationError::MissingKid),
                "header {header} should be rejected"
            );
        }
    }

    #[test]
    fn test_extract_kid_malformed_token() {
        assert_eq!(
            extract_kid("not.a.valid.jwt"),
            Err(JwtValidationError::MalformedToken)
        );
        assert_eq!(extract_kid("only.two"), Err(JwtValidationError::MalformedToken));
        assert_eq!(extract_kid(""), Err(JwtValidationError::MalformedToken));
        assert_eq!(
            extract_kid("!!!invalid!!!.payload.signature"),
            Err(JwtValidationError::MalformedToken)
        );

        let not_json = format!("{}.payload.signature", URL_SAFE_NO_PAD.encode(b"not json"));
        assert_eq!(extract_kid(&not_json), Err(JwtValidationError::MalformedToken));
    }

    #[test]
    fn test_extract_kid_rejects_oversized_token() {
        let token = "a".repeat(MAX_JWT_SIZE_BYTES + 1);
        assert_eq!(extract_kid(&token), Err(JwtValidationError::TokenTooLarge));
    }

    #[test]
    fn test_error_messages_are_uniform() {
        let messages: Vec<String> = [
            JwtValidationError::TokenTooLarge,
            JwtValidationError::MalformedToken,
            JwtValidationError::MissingKid,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        assert!(messages
            .iter()
            .all(|m| m == "The access token is invalid or expired"));
    }

    #[test]
    fn test_clock_skew_bounds() {
        assert_eq!(DEFAULT_CLOCK_SKEW, Duration::from_secs(60));
        assert!(DEFAULT_CLOCK_SKEW <= MAX_CLOCK_SKEW);
    }
}
