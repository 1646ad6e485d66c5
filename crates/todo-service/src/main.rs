//! Todo Service
//!
//! Entry point: loads configuration, connects to PostgreSQL, runs migrations,
//! starts the key refresh task and serves HTTP until SIGINT/SIGTERM.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use todo_service::auth::JwksClient;
use todo_service::config::Config;
use todo_service::observability::metrics::init_metrics_recorder;
use todo_service::routes::{self, AppState};
use todo_service::tasks::start_key_refresh;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Statement timeout applied to every pooled connection.
const STATEMENT_TIMEOUT_SECONDS: u32 = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting Todo service");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        issuer = %config.issuer_url,
        jwks_url = %config.jwks_url,
        jwks_cache_ttl_seconds = config.jwks_cache_ttl_seconds,
        jwt_clock_skew_seconds = config.jwt_clock_skew_seconds,
        "Configuration loaded successfully"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics: {}", e);
        anyhow::anyhow!(e)
    })?;

    info!("Connecting to database...");
    let db_url_with_timeout = add_query_timeout(&config.database_url, STATEMENT_TIMEOUT_SECONDS);
    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&db_url_with_timeout)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })?;

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| {
            error!("Failed to run migrations: {}", e);
            e
        })?;

    info!("Database connection established, migrations applied");

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;
    let grace_period = Duration::from_secs(config.shutdown_grace_seconds);

    let jwks_client = Arc::new(JwksClient::with_ttl(
        config.jwks_url.clone(),
        Duration::from_secs(config.jwks_cache_ttl_seconds),
    ));

    let shutdown_token = CancellationToken::new();

    let key_refresh_handle = tokio::spawn(
        start_key_refresh(Arc::clone(&jwks_client), shutdown_token.child_token())
            .instrument(tracing::info_span!("todo.task.key_refresh")),
    );

    let state = Arc::new(AppState {
        pool: db_pool.clone(),
        config,
        jwks_client,
    });
    let app = routes::build_routes(state, metrics_handle);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Todo service listening on {}", addr);

    tokio::spawn(shutdown_signal(shutdown_token.clone()));

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_token.clone().cancelled_owned())
        .into_future();

    let grace_expired = async {
        shutdown_token.cancelled().await;
        tokio::time::sleep(grace_period).await;
    };

    tokio::select! {
        result = server => result?,
        () = grace_expired => {
            warn!(
                grace_seconds = grace_period.as_secs(),
                "Grace period elapsed with requests in flight, forcing shutdown"
            );
        }
    }

    shutdown_token.cancel();
    if let Err(e) = key_refresh_handle.await {
        warn!("Key refresh task ended abnormally: {}", e);
    }

    db_pool.close().await;
    info!("Todo service shutdown complete");

    Ok(())
}

/// Cancel `token` on SIGINT or SIGTERM.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => {
                error!("Failed to listen for SIGINT: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    token.cancel();
}

/// Adds statement_timeout to the database URL.
fn add_query_timeout(url: &str, timeout_secs: u32) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}options=-c%20statement_timeout%3D{}s",
        url, separator, timeout_secs
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_query_timeout_without_params() {
        assert_eq!(
            add_query_timeout("postgres://localhost/todo", 5),
            "postgres://localhost/todo?options=-c%20statement_timeout%3D5s"
        );
    }

    #[test]
    fn test_add_query_timeout_with_params() {
        assert_eq!(
            add_query_timeout("postgres://localhost/todo?sslmode=disable", 5),
            "postgres://localhost/todo?sslmode=disable&options=-c%20statement_timeout%3D5s"
        );
    }
}
