//! Authentication module for the Todo service.
//!
//! Validates bearer tokens issued by the configured identity provider.
//!
//! # Components
//!
//! - `clock` - Injectable time source for cache expiry
//! - `jwks` - JWKS client for fetching and caching the issuer's public keys
//! - `jwt` - RS256 token validation using cached JWKS keys
//! - `claims` - Claims carried by a validated token
//! - `identity` - Typed caller identity extracted from validated claims

pub mod claims;
pub mod clock;
pub mod identity;
pub mod jwks;
pub mod jwt;

pub use claims::{Audience, Claims};
pub use clock::{Clock, SystemClock};
pub use identity::Identity;
pub use jwks::{Jwk, JwksClient, KeySet};
pub use jwt::JwtValidator;
