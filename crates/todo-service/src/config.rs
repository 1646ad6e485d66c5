//! Todo service configuration.
//!
//! Configuration is loaded from environment variables. The database URL is
//! redacted in Debug output.

use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";

/// Default JWKS cache TTL in seconds (5 minutes).
pub const DEFAULT_JWKS_CACHE_TTL_SECONDS: u64 = 300;

/// Default grace period for in-flight requests on shutdown.
pub const DEFAULT_SHUTDOWN_GRACE_SECONDS: u64 = 10;

/// Todo service configuration.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Server bind address (default: "0.0.0.0:8000").
    pub bind_address: String,

    /// Expected `iss` claim, e.g. "https://tenant.auth0.com/".
    pub issuer_url: String,

    /// URL of the issuer's JWKS document.
    pub jwks_url: String,

    /// Audience that must appear in every token's `aud` claim.
    pub audience: String,

    /// How long a fetched key set is served before it is re-fetched.
    pub jwks_cache_ttl_seconds: u64,

    /// Leeway for `exp`/`nbf` validation.
    pub jwt_clock_skew_seconds: u64,

    /// How long shutdown waits for in-flight requests before forcing closure.
    pub shutdown_grace_seconds: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("issuer_url", &self.issuer_url)
            .field("jwks_url", &self.jwks_url)
            .field("audience", &self.audience)
            .field("jwks_cache_ttl_seconds", &self.jwks_cache_ttl_seconds)
            .field("jwt_clock_skew_seconds", &self.jwt_clock_skew_seconds)
            .field("shutdown_grace_seconds", &self.shutdown_grace_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid issuer configuration: {0}")]
    InvalidIssuer(String),

    #[error("Invalid JWKS cache TTL configuration: {0}")]
    InvalidJwksCacheTtl(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid shutdown grace period configuration: {0}")]
    InvalidShutdownGrace(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = required(vars, "DATABASE_URL")?;
        let audience = required(vars, "AUTH0_AUDIENCE")?;

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        // An explicit issuer URL wins over the tenant domain.
        let issuer_url = match vars.get("AUTH_ISSUER_URL") {
            Some(url) => url.clone(),
            None => {
                let domain = vars
                    .get("AUTH0_DOMAIN")
                    .filter(|d| !d.trim().is_empty())
                    .ok_or_else(|| ConfigError::MissingEnvVar("AUTH0_DOMAIN".to_string()))?;
                format!("https://{}/", domain.trim().trim_end_matches('/'))
            }
        };

        if !issuer_url.starts_with("https://") && !issuer_url.starts_with("http://") {
            return Err(ConfigError::InvalidIssuer(format!(
                "issuer must be an http(s) URL, got '{}'",
                issuer_url
            )));
        }

        let jwks_url = vars
            .get("AUTH_JWKS_URL")
            .cloned()
            .unwrap_or_else(|| default_jwks_url(&issuer_url));

        let jwks_cache_ttl_seconds = parse_u64(
            vars,
            "JWKS_CACHE_TTL_SECONDS",
            DEFAULT_JWKS_CACHE_TTL_SECONDS,
            ConfigError::InvalidJwksCacheTtl,
        )?;
        if jwks_cache_ttl_seconds == 0 {
            return Err(ConfigError::InvalidJwksCacheTtl(
                "JWKS_CACHE_TTL_SECONDS must be greater than 0".to_string(),
            ));
        }

        let jwt_clock_skew_seconds = parse_u64(
            vars,
            "JWT_CLOCK_SKEW_SECONDS",
            DEFAULT_CLOCK_SKEW.as_secs(),
            ConfigError::InvalidJwtClockSkew,
        )?;
        if jwt_clock_skew_seconds == 0 {
            return Err(ConfigError::InvalidJwtClockSkew(
                "JWT_CLOCK_SKEW_SECONDS must be positive".to_string(),
            ));
        }
        if jwt_clock_skew_seconds > MAX_CLOCK_SKEW.as_secs() {
            return Err(ConfigError::InvalidJwtClockSkew(format!(
                "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                MAX_CLOCK_SKEW.as_secs(),
                jwt_clock_skew_seconds
            )));
        }

        let shutdown_grace_seconds = parse_u64(
            vars,
            "SHUTDOWN_GRACE_SECONDS",
            DEFAULT_SHUTDOWN_GRACE_SECONDS,
            ConfigError::InvalidShutdownGrace,
        )?;

        Ok(Config {
            database_url,
            bind_address,
            issuer_url,
            jwks_url,
            audience,
            jwks_cache_ttl_seconds,
            jwt_clock_skew_seconds,
            shutdown_grace_seconds,
        })
    }
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn parse_u64(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
    to_error: fn(String) -> ConfigError,
) -> Result<u64, ConfigError> {
    match vars.get(name) {
        Some(value_str) => value_str.parse().map_err(|e| {
            to_error(format!(
                "{} must be a valid non-negative integer, got '{}': {}",
                name, value_str, e
            ))
        }),
        None => Ok(default),
    }
}

fn default_jwks_url(issuer_url: &str) -> String {
    format!("{}/.well-known/jwks.json", issuer_url.trim_end_matches('/'))
}
