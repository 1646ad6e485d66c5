//! Observability for the Todo service.
//!
//! Provides metrics definitions and recording helpers.

pub mod metrics;
