//! JWKS refresh background task.
//!
//! Fetches the key set immediately on start (warming the cache before the
//! first request), then every `cache_ttl`. A failed fetch leaves the current
//! snapshot in place; the next tick tries again.
//!
//! # Graceful Shutdown
//!
//! Exits when the cancellation token is triggered.

use crate::auth::JwksClient;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run the key refresh loop until `cancel_token` fires.
pub async fn start_key_refresh(jwks_client: Arc<JwksClient>, cancel_token: CancellationToken) {
    let mut interval = tokio::time::interval(jwks_client.cache_ttl());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        target: "todo.task.key_refresh",
        interval_seconds = jwks_client.cache_ttl().as_secs(),
        "Key refresh task started"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = jwks_client.refresh().await {
                    warn!(target: "todo.task.key_refresh", error = %e, "Scheduled key refresh failed");
                }
            }
            _ = cancel_token.cancelled() => {
                info!(target: "todo.task.key_refresh", "Key refresh task received shutdown signal, exiting");
                break;
            }
        }
    }
}
