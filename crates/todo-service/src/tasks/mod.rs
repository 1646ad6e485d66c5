//! Background tasks for the Todo service.
//!
//! - `key_refresh` - re-fetches the JWKS on the cache TTL

pub mod key_refresh;

pub use key_refresh::start_key_refresh;
