// crates/icdx-config/tests/common/mod.rs
// ============================================================================
// Module: Common Config Test Utilities
// Description: Shared helpers for icdx-config tests.
// Purpose: Provide minimal valid configs and error assertions.
// Dependencies: icdx-config, toml
// ============================================================================

//! ## Overview
//! Shared helpers for config validation tests.

use std::collections::BTreeMap;

use icdx_config::ConfigError;
use icdx_config::IcdxConfig;

/// Result type used by config tests.
pub type TestResult = Result<(), String>;

/// Minimal valid `icdx.toml` body.
pub const MINIMAL_TOML: &str = r#"
[amqp]
host = "broker.internal"
username = "icdx"
password = "secret"
"#;

/// Parses the minimal valid config.
pub fn minimal_config() -> Result<IcdxConfig, ConfigError> {
    IcdxConfig::parse(MINIMAL_TOML)
}

/// Builds an option map where every known key maps to `value`.
pub fn uniform_options(value: &str) -> BTreeMap<String, String> {
    [
        "icdx_amqp_host",
        "icdx_amqp_port",
        "icdx_amqp_vhost",
        "icdx_amqp_username",
        "icdx_amqp_password",
        "icdx_amqp_exchange",
        "icdx_amqp_routing_key",
        "icdx_search_timeout",
        "icdx_connect_timeout",
    ]
    .into_iter()
    .map(|key| (key.to_string(), value.to_string()))
    .collect()
}

/// Asserts that `result` failed with a message containing `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
