// crates/icdx-amqp/src/correlation.rs
// ============================================================================
// Module: Correlation Identifiers
// Description: Generation of per-call correlation identifiers.
// Purpose: Link each published request to exactly one reply.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! Correlation identifiers are generated per call from a boot-scoped random
//! seed plus a monotonic counter, so concurrent callers sharing a reply queue
//! never receive each other's replies.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use rand::RngCore;
use rand::rngs::OsRng;

/// Prefix used by [`CorrelationIdGenerator::default`].
pub const DEFAULT_CORRELATION_PREFIX: &str = "icdx";

/// Boot-scoped correlation ID generator.
///
/// # Invariants
/// - Issued identifiers are unique within the process lifetime.
#[derive(Debug)]
pub struct CorrelationIdGenerator {
    /// Prefix included in every generated correlation ID.
    prefix: &'static str,
    /// Boot-scoped random identifier for entropy.
    boot_id: u64,
    /// Monotonic counter for IDs issued in this process.
    counter: AtomicU64,
}

impl CorrelationIdGenerator {
    /// Creates a new generator with the given prefix.
    #[must_use]
    pub fn new(prefix: &'static str) -> Self {
        let mut bytes = [0u8; 8];
        OsRng.fill_bytes(&mut bytes);
        Self {
            prefix,
            boot_id: u64::from_be_bytes(bytes),
            counter: AtomicU64::new(1),
        }
    }

    /// Issues a new correlation ID.
    #[must_use]
    pub fn issue(&self) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{:016x}-{:016x}", self.prefix, self.boot_id, seq)
    }
}

impl Default for CorrelationIdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CORRELATION_PREFIX)
    }
}

#[cfg(test)]
mod tests;
