// crates/icdx-functions/tests/common/mod.rs
// ============================================================================
// Module: Common Function Test Utilities
// Description: Shared helpers for workflow function tests.
// Purpose: Build functions over in-memory transports and recording invokers.
// Dependencies: icdx-amqp, icdx-functions, serde_json
// ============================================================================

//! ## Overview
//! Provides function builders and a recording invoker.

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

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use icdx_amqp::AmqpFacade;
use icdx_amqp::CallResponse;
use icdx_amqp::CallbackConnector;
use icdx_amqp::ConnectionConfig;
use icdx_amqp::FacadeError;
use icdx_functions::FunctionInvoker;
use icdx_functions::GetEventFunction;
use serde_json::Map;
use serde_json::Value;

/// UUID used by the success scenario.
pub const SAMPLE_UUID: &str = "ec6167c0-1c2e-11e8-c000-000000000022";

/// Identifiers used by the failure scenario.
pub const FAILURE_UUIDS: &[&str] = &[
    "baduuid",
    "123",
    "Љ\tЩ\tщ\tӃ",
    "؟\tب\tحٍ\t۳",
    "\tΎ\tΔ\tδ\tϠ",
    "\tĄ\tą\tĲ\tĳ",
];

/// Connection config where every option was set to `10`.
pub fn uniform_config() -> ConnectionConfig {
    ConnectionConfig {
        host: "10".to_string(),
        port: 10,
        username: "10".to_string(),
        password: "10".to_string(),
        vhost: "10".to_string(),
        exchange: String::new(),
        routing_key: "10".to_string(),
        timeout: Duration::from_secs(10),
        connect_timeout: Duration::from_secs(10),
    }
}

/// Builds the function over an in-memory connector.
pub fn function_with(connector: CallbackConnector) -> GetEventFunction {
    GetEventFunction::new(Arc::new(AmqpFacade::new(connector)), uniform_config())
}

/// Builds an input map holding `icdx_uuid`.
pub fn uuid_inputs(uuid: &str) -> Map<String, Value> {
    let mut inputs = Map::new();
    inputs.insert("icdx_uuid".to_string(), Value::String(uuid.to_string()));
    inputs
}

/// Invoker recording each call and answering with a fixed outcome.
pub struct RecordingInvoker {
    /// Calls seen as `(payload, operation)`.
    pub calls: Mutex<Vec<(String, String)>>,
    /// Reply body, or the error to return.
    pub outcome: Result<Vec<u8>, FacadeError>,
}

impl RecordingInvoker {
    /// Creates an invoker replying with `body`.
    pub fn replying(body: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcome: Ok(body.as_bytes().to_vec()),
        }
    }

    /// Creates an invoker failing with `err`.
    pub fn failing(err: FacadeError) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcome: Err(err),
        }
    }
}

impl FunctionInvoker for RecordingInvoker {
    fn invoke(
        &self,
        payload: &str,
        operation: &str,
        _config: &ConnectionConfig,
    ) -> Result<CallResponse, FacadeError> {
        self.calls.lock().unwrap().push((payload.to_string(), operation.to_string()));
        match &self.outcome {
            Ok(body) => CallResponse::decode(body),
            Err(err) => Err(err.clone()),
        }
    }
}
