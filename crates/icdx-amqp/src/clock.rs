// crates/icdx-amqp/src/clock.rs
// ============================================================================
// Module: ICDX AMQP Clock
// Description: Time source used to bound the reply wait.
// Purpose: Let callers substitute deterministic time in tests.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The facade reads time only through [`Clock`] when computing reply deadlines
//! and call latency. [`SystemClock`] is the production implementation.

use std::time::Instant;

/// Monotonic time source.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
