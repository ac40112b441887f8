// crates/icdx-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic starting point for new deployments.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for `icdx.toml`. The output is deterministic and always
//! passes [`crate::IcdxConfig::parse`].

/// Returns a canonical example `icdx.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[amqp]
host = "localhost"
port = 5672
username = "guest"
password = "guest"
vhost = "/"
exchange = ""
routing_key = "icdx.requests"
timeout_ms = 10000
connect_timeout_ms = 5000

[audit]
enabled = true
path = "icdx-audit.jsonl"
"#,
    )
}
