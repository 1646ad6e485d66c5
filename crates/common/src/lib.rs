//! Common utilities shared across the Todo API crates.

#![warn(clippy::pedantic)]

/// Module for JWT utilities (size limits, clock skew, header inspection)
pub mod jwt;
