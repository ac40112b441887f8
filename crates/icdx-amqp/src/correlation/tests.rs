// crates/icdx-amqp/src/correlation/tests.rs
// ============================================================================
// Module: Correlation Identifier Tests
// Description: Unit tests for correlation ID generation.
// Purpose: Validate formatting and uniqueness guarantees.
// Dependencies: icdx-amqp
// ============================================================================

//! ## Overview
//! Validates that generated correlation IDs follow stable formatting rules and
//! never repeat, including under concurrent issuance.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

use super::CorrelationIdGenerator;
use super::DEFAULT_CORRELATION_PREFIX;

// ============================================================================
// SECTION: Generator Tests
// ============================================================================

#[test]
fn generator_issues_formatted_ids() {
    let generator = CorrelationIdGenerator::new("icdx");
    let first = generator.issue();
    let second = generator.issue();
    assert_ne!(first, second);
    let parts: Vec<&str> = first.split('-').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "icdx");
    assert_eq!(parts[1].len(), 16);
    assert_eq!(parts[2].len(), 16);
    assert!(parts[1].chars().all(|ch| ch.is_ascii_hexdigit()));
    assert!(parts[2].chars().all(|ch| ch.is_ascii_hexdigit()));
}

#[test]
fn default_generator_uses_icdx_prefix() {
    let generator = CorrelationIdGenerator::default();
    assert!(generator.issue().starts_with(&format!("{DEFAULT_CORRELATION_PREFIX}-")));
}

#[test]
fn concurrent_issuance_never_repeats() {
    let generator = Arc::new(CorrelationIdGenerator::default());
    let handles: Vec<_> = (0 .. 4)
        .map(|_| {
            let generator = Arc::clone(&generator);
            thread::spawn(move || (0 .. 250).map(|_| generator.issue()).collect::<Vec<_>>())
        })
        .collect();
    let mut seen = BTreeSet::new();
    for handle in handles {
        for id in handle.join().expect("issuer thread") {
            assert!(seen.insert(id), "duplicate correlation id");
        }
    }
    assert_eq!(seen.len(), 1000);
}
