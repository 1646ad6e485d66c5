//! Time source for the key cache.
//!
//! Cache expiry is computed against a [`Clock`] so tests can move time
//! forward without sleeping.

use std::time::Instant;

#[cfg(test)]
pub use manual::ManualClock;

/// Monotonic time source.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall-clock backed [`Clock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
