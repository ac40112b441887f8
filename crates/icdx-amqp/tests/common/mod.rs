// crates/icdx-amqp/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared helpers for icdx-amqp tests.
// Purpose: Provide reusable configs and payload builders for facade tests.
// Dependencies: icdx-amqp, serde_json
// ============================================================================

//! ## Overview
//! Provides shared helper functions for facade and transport tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::time::Duration;

use icdx_amqp::ConnectionConfig;
use serde_json::json;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// UUID used by the get-event scenarios.
pub const SAMPLE_UUID: &str = "ec6167c0-1c2e-11e8-c000-000000000022";

/// Identifiers that are not UUIDs, including non-ASCII scripts and tabs.
pub const MALFORMED_UUIDS: &[&str] = &[
    "baduuid",
    "123",
    "Љ\tЩ\tщ\tӃ",
    "؟\tب\tحٍ\t۳",
    "\tΎ\tΔ\tδ\tϠ",
    "\tĄ\tą\tĲ\tĳ",
];

/// Creates a fully resolved connection config.
pub fn sample_config() -> ConnectionConfig {
    ConnectionConfig {
        host: "localhost".to_string(),
        port: 5672,
        username: "guest".to_string(),
        password: "guest".to_string(),
        vhost: "/".to_string(),
        exchange: String::new(),
        routing_key: "icdx".to_string(),
        timeout: Duration::from_secs(10),
        connect_timeout: Duration::from_secs(10),
    }
}

/// Serializes a get-event request body.
pub fn get_event_payload(uuid: &str) -> String {
    json!({"id": 0, "uuid": uuid}).to_string()
}
