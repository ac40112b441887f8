// crates/icdx-functions/src/result.rs
// ============================================================================
// Module: Function Results
// Description: Result and error types returned by workflow functions.
// Purpose: Carry the result object and optional status code to the caller.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`FunctionResult`] always carries a JSON object with a `success` flag.
//! `status_code` is present only when the round trip completed.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Outcome of a workflow function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionResult {
    /// Result object handed back to the workflow.
    pub value: Value,
    /// 200 or 204 after a completed round trip; absent on facade failure.
    pub status_code: Option<u16>,
}

impl FunctionResult {
    /// Returns the `success` flag of the result object.
    #[must_use]
    pub fn success(&self) -> bool {
        self.value.get("success").and_then(Value::as_bool).unwrap_or(false)
    }
}

/// Errors raised before a function reaches the facade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunctionError {
    /// A required input was not supplied.
    #[error("missing required input: {0}")]
    MissingInput(String),
    /// An input was supplied with an unusable value.
    #[error("invalid input {name}: {reason}")]
    InvalidInput {
        /// Input name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}
