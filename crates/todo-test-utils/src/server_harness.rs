//! Test server harness for E2E testing.
//!
//! Provides `TestTodoServer`, which runs the real router on a random port
//! against a mocked identity provider. The mock publishes the primary test
//! key at `/.well-known/jwks.json` and acts as the token issuer.

use crate::client::TestClient;
use crate::tokens::{jwks_document, TestClaims, TestKeypair, TEST_AUDIENCE};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sqlx::PgPool;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use todo_service::auth::JwksClient;
use todo_service::config::Config;
use todo_service::observability::metrics::init_metrics_recorder;
use todo_service::routes::{self, AppState};
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// JWKS path served by the mock issuer.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// The global recorder can only be installed once per test binary.
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Test harness for spawning the Todo service in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[sqlx::test(migrations = "../../migrations")]
/// async fn test_create_list(pool: PgPool) -> Result<()> {
///     let server = TestTodoServer::spawn(pool).await?;
///
///     let response = reqwest::Client::new()
///         .post(format!("{}/list", server.url()))
///         .bearer_auth(server.token_for("auth0|alice"))
///         .json(&serde_json::json!({"title": "Chores"}))
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 201);
///     Ok(())
/// }
/// ```
pub struct TestTodoServer {
    addr: SocketAddr,
    pool: PgPool,
    config: Config,
    mock_issuer: MockServer,
    keypair: TestKeypair,
    _handle: JoinHandle<()>,
}

impl TestTodoServer {
    /// Spawn a server whose issuer publishes the primary test key.
    pub async fn spawn(pool: PgPool) -> Result<Self, anyhow::Error> {
        let mock_issuer = MockServer::start().await;
        let keypair = TestKeypair::primary();

        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_document(&[&keypair])))
            .mount(&mock_issuer)
            .await;

        Self::spawn_with_issuer(pool, mock_issuer, keypair).await
    }

    /// Spawn against an already configured mock issuer.
    ///
    /// Tests that need a failing or rotating JWKS endpoint mount their own
    /// responses on `mock_issuer` first.
    pub async fn spawn_with_issuer(
        pool: PgPool,
        mock_issuer: MockServer,
        keypair: TestKeypair,
    ) -> Result<Self, anyhow::Error> {
        let vars = HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://test/test".to_string(),
            ),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            (
                "AUTH_ISSUER_URL".to_string(),
                format!("{}/", mock_issuer.uri()),
            ),
            (
                "AUTH_JWKS_URL".to_string(),
                format!("{}{}", mock_issuer.uri(), JWKS_PATH),
            ),
            ("AUTH0_AUDIENCE".to_string(), TEST_AUDIENCE.to_string()),
        ]);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let jwks_client = Arc::new(JwksClient::with_ttl(
            config.jwks_url.clone(),
            Duration::from_secs(config.jwks_cache_ttl_seconds),
        ));

        let state = Arc::new(AppState {
            pool: pool.clone(),
            config: config.clone(),
            jwks_client,
        });

        let app = routes::build_routes(state, test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            pool,
            config,
            mock_issuer,
            keypair,
            _handle: handle,
        })
    }

    /// Get reference to the database pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The mocked identity provider.
    pub fn mock_issuer(&self) -> &MockServer {
        &self.mock_issuer
    }

    /// Issuer URL the server validates `iss` against.
    pub fn issuer(&self) -> &str {
        &self.config.issuer_url
    }

    /// The key whose public half the mock issuer publishes.
    pub fn keypair(&self) -> &TestKeypair {
        &self.keypair
    }

    /// Valid claims for `sub`.
    pub fn claims_for(&self, sub: &str) -> TestClaims {
        TestClaims::valid(sub, self.issuer())
    }

    /// A valid bearer token for `sub`.
    pub fn token_for(&self, sub: &str) -> String {
        self.keypair.sign(&self.claims_for(sub))
    }

    /// A client that sends requests as `sub`.
    pub fn client_for(&self, sub: &str) -> TestClient {
        TestClient::new(self, sub)
    }

    /// Sign arbitrary claims with the published key.
    pub fn sign(&self, claims: &TestClaims) -> String {
        self.keypair.sign(claims)
    }

    /// Number of JWKS fetches the server has made.
    pub async fn jwks_fetch_count(&self) -> usize {
        self.mock_issuer
            .received_requests()
            .await
            .map(|requests| {
                requests
                    .iter()
                    .filter(|request| request.url.path() == JWKS_PATH)
                    .count()
            })
            .unwrap_or(0)
    }
}

impl Drop for TestTodoServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
