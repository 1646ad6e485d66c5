//! JWKS client for fetching and caching the issuer's public keys.
//!
//! The client fetches the issuer's JSON Web Key Set and serves lookups from an
//! immutable snapshot. A snapshot is only ever replaced as a whole, so
//! concurrent readers see either the previous complete key set or the new one.
//!
//! # Refresh policy
//!
//! - A snapshot is fresh for `cache_ttl` after it was fetched
//! - Lookups against an empty or expired snapshot refresh on demand; concurrent
//!   callers share one fetch
//! - The background task in `tasks::key_refresh` re-fetches every `cache_ttl`
//! - If a refresh fails while a stale snapshot exists, the stale keys keep
//!   being served; with no snapshot at all the lookup fails as unauthenticated
//! - After a failed fetch, lookups do not fetch again until a backoff of
//!   `min(30s, cache_ttl)` has passed
//! - While a fetch is in flight, callers holding stale keys use them instead
//!   of queueing behind it

use crate::auth::clock::{Clock, SystemClock};
use crate::errors::ApiError;
use crate::observability::metrics;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tracing::instrument;

/// Default cache TTL in seconds (5 minutes).
const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// Timeout for a single JWKS fetch.
const FETCH_TIMEOUT_SECONDS: u64 = 10;

/// Minimum wait after a failed fetch before requests trigger another one.
const FAILED_FETCH_BACKOFF_SECONDS: u64 = 30;

/// JSON Web Key from the JWKS endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA" for RS256 keys).
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    ///
    /// Optional in a JWKS document; keys without one cannot be selected and
    /// are dropped from the snapshot.
    #[serde(default)]
    pub kid: Option<String>,

    /// RSA modulus (base64url encoded).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default)]
    pub e: Option<String>,

    /// Algorithm (should be "RS256" when present).
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig" when present).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
}

/// JWKS document.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    pub keys: Vec<Jwk>,
}

/// An immutable, fully-built key set snapshot.
#[derive(Debug)]
pub struct KeySet {
    keys: HashMap<String, Jwk>,
    fetched_at: Instant,
}

impl KeySet {
    fn from_response(response: JwksResponse, fetched_at: Instant) -> Self {
        let keys = response
            .keys
            .into_iter()
            .filter_map(|key| match key.kid.clone() {
                Some(kid) => Some((kid, key)),
                None => {
                    tracing::debug!(target: "todo.auth.jwks", kty = %key.kty, "Skipping JWK without kid");
                    None
                }
            })
            .collect();

        Self { keys, fetched_at }
    }

    pub fn get(&self, kid: &str) -> Option<&Jwk> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// JWKS client for fetching and caching public keys.
pub struct JwksClient {
    /// URL to the JWKS endpoint.
    jwks_url: String,

    /// HTTP client for fetching JWKS.
    http_client: reqwest::Client,

    /// Current snapshot, swapped atomically on refresh.
    snapshot: watch::Sender<Option<Arc<KeySet>>>,

    /// Serializes fetches so concurrent misses trigger a single request.
    /// Holds the earliest instant an on-demand fetch may follow a failure.
    refresh_lock: Mutex<Option<Instant>>,

    /// How long a snapshot stays fresh.
    cache_ttl: Duration,

    clock: Arc<dyn Clock>,
}

impl JwksClient {
    /// Create a new JWKS client with the default 5 minute TTL.
    pub fn new(jwks_url: String) -> Self {
        Self::with_ttl(jwks_url, Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS))
    }

    /// Create a new JWKS client with custom cache TTL.
    pub fn with_ttl(jwks_url: String, cache_ttl: Duration) -> Self {
        Self::with_clock(jwks_url, cache_ttl, Arc::new(SystemClock))
    }

    /// Create a new JWKS client with custom cache TTL and time source.
    pub fn with_clock(jwks_url: String, cache_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECONDS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "todo.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            snapshot: watch::Sender::new(None),
            refresh_lock: Mutex::new(None),
            cache_ttl,
            clock,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// The currently published key set, fresh or not.
    pub fn current(&self) -> Option<Arc<KeySet>> {
        self.snapshot.borrow().clone()
    }

    fn is_fresh(&self, key_set: &KeySet) -> bool {
        self.clock.now().saturating_duration_since(key_set.fetched_at) < self.cache_ttl
    }

    /// Get a JWK by key ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthenticated` if the key ID is unknown, or if no
    /// key set can be obtained at all.
    #[instrument(skip_all, name = "todo.auth.jwks.get_key")]
    pub async fn get_key(&self, kid: &str) -> Result<Jwk, ApiError> {
        let key_set = match self.current() {
            Some(key_set) if self.is_fresh(&key_set) => {
                tracing::debug!(target: "todo.auth.jwks", kid = %kid, "JWKS cache hit");
                key_set
            }
            _ => self.refresh_if_stale().await?,
        };

        key_set.get(kid).cloned().ok_or_else(|| {
            tracing::debug!(target: "todo.auth.jwks", kid = %kid, "Key not found in JWKS");
            ApiError::Unauthenticated
        })
    }

    /// Refresh unless another caller already did, or a recent failure is
    /// still backing off.
    async fn refresh_if_stale(&self) -> Result<Arc<KeySet>, ApiError> {
        let mut retry_after = match (self.current(), self.refresh_lock.try_lock()) {
            (_, Ok(guard)) => guard,
            (Some(stale), Err(_)) => {
                tracing::debug!(target: "todo.auth.jwks", "JWKS refresh in flight, serving stale keys");
                return Ok(stale);
            }
            (None, Err(_)) => self.refresh_lock.lock().await,
        };

        let cached = self.current();
        if let Some(key_set) = &cached {
            if self.is_fresh(key_set) {
                return Ok(Arc::clone(key_set));
            }
        }

        if (*retry_after).is_some_and(|at| self.clock.now() < at) {
            return match cached {
                Some(stale) => {
                    tracing::debug!(target: "todo.auth.jwks", "JWKS refresh backing off, serving stale keys");
                    Ok(stale)
                }
                None => {
                    tracing::debug!(target: "todo.auth.jwks", "JWKS refresh backing off, no keys cached");
                    Err(ApiError::Unauthenticated)
                }
            };
        }

        match self.fetch_and_publish().await {
            Ok(key_set) => {
                *retry_after = None;
                Ok(key_set)
            }
            Err(e) => {
                *retry_after = Some(self.clock.now() + self.failure_backoff());
                match cached {
                    Some(stale) => {
                        tracing::warn!(
                            target: "todo.auth.jwks",
                            error = %e,
                            "JWKS refresh failed, serving stale keys"
                        );
                        Ok(stale)
                    }
                    None => {
                        tracing::error!(
                            target: "todo.auth.jwks",
                            error = %e,
                            "JWKS refresh failed and no keys are cached"
                        );
                        Err(ApiError::Unauthenticated)
                    }
                }
            }
        }
    }

    /// Fetch the key set unconditionally and publish it.
    ///
    /// Used by the background refresh task. On failure the current snapshot is
    /// left untouched and on-demand fetches back off.
    #[instrument(skip_all, name = "todo.auth.jwks.refresh")]
    pub async fn refresh(&self) -> Result<Arc<KeySet>, ApiError> {
        let mut retry_after = self.refresh_lock.lock().await;
        match self.fetch_and_publish().await {
            Ok(key_set) => {
                *retry_after = None;
                Ok(key_set)
            }
            Err(e) => {
                *retry_after = Some(self.clock.now() + self.failure_backoff());
                tracing::warn!(target: "todo.auth.jwks", error = %e, "JWKS refresh failed");
                Err(ApiError::Unauthenticated)
            }
        }
    }

    fn failure_backoff(&self) -> Duration {
        Duration::from_secs(FAILED_FETCH_BACKOFF_SECONDS).min(self.cache_ttl)
    }

    async fn fetch_and_publish(&self) -> Result<Arc<KeySet>, FetchError> {
        let result = self.fetch().await;
        metrics::record_jwks_refresh(if result.is_ok() { "success" } else { "error" });

        let key_set = Arc::new(result?);
        if key_set.is_empty() {
            tracing::warn!(target: "todo.auth.jwks", "JWKS document contains no selectable keys");
        }
        tracing::info!(
            target: "todo.auth.jwks",
            key_count = key_set.len(),
            "JWKS cache refreshed"
        );

        self.snapshot.send_replace(Some(Arc::clone(&key_set)));
        Ok(key_set)
    }

    async fn fetch(&self) -> Result<KeySet, FetchError> {
        tracing::debug!(target: "todo.auth.jwks", url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(FetchError::Request)?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let jwks: JwksResponse = response.json().await.map_err(FetchError::Body)?;

        Ok(KeySet::from_response(jwks, self.clock.now()))
    }
}

/// Reasons a JWKS fetch can fail. Logged only; callers see `Unauthenticated`.
#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error("request failed: {0}")]
    Request(reqwest::Error),

    #[error("endpoint returned status {0}")]
    Status(u16),

    #[error("invalid JWKS document: {0}")]
    Body(reqwest::Error),
}
