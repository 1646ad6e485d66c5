//! Todo Service Library
//!
//! A multi-tenant list/item API. Every request carries a bearer token issued
//! by an external identity provider; the token's subject is the caller's
//! identity and scopes every query.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs -> handlers/*.rs -> repositories/*.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - Key cache, token validation, caller identity
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authentication and HTTP metrics layers
//! - `models` - Request/response types
//! - `observability` - Prometheus metrics
//! - `repositories` - Ownership-scoped database access
//! - `routes` - Axum router setup
//! - `tasks` - Background tasks

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod tasks;
