//! # Todo Test Utilities
//!
//! Shared test utilities for the Todo service:
//! - `TestTodoServer` - the real router on a random port with a mocked issuer
//! - `TestClient` - requests as one identity
//! - `TestKeypair` / `TestClaims` - RS256 token signing
//!
//! ## Usage
//!
//! ```rust,ignore
//! use todo_test_utils::*;
//!
//! #[sqlx::test(migrations = "../../migrations")]
//! async fn test_example(pool: PgPool) -> Result<()> {
//!     let server = TestTodoServer::spawn(pool).await?;
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/list", server.url()))
//!         .bearer_auth(server.token_for("auth0|alice"))
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod server_harness;
pub mod tokens;

pub use client::*;
pub use server_harness::*;
pub use tokens::*;
