// crates/icdx-functions/src/get_event.rs
// ============================================================================
// Module: ICDX Get Event Function
// Description: Workflow function fetching one ICDX event by UUID.
// Purpose: Map the `icdx_uuid` input onto a `get_event` facade call.
// Dependencies: icdx-amqp, serde_json
// ============================================================================

//! ## Overview
//! [`GetEventFunction`] sends `{"id": 0, "uuid": <icdx_uuid>}` with operation
//! `get_event`. The UUID is forwarded verbatim; the ICDX side decides whether
//! it names an event and answers with `success` accordingly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use icdx_amqp::ConnectionConfig;
use icdx_amqp::FacadeError;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::invoker::FunctionInvoker;
use crate::result::FunctionError;
use crate::result::FunctionResult;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Workflow function name.
pub const FUNCTION_NAME: &str = "icdx_get_event";
/// Facade operation name.
pub const GET_EVENT_OPERATION: &str = "get_event";
/// ICDX request code for event lookup.
pub const GET_EVENT_ID: u64 = 0;
/// Input holding the event UUID.
pub const UUID_INPUT: &str = "icdx_uuid";

// ============================================================================
// SECTION: Function
// ============================================================================

/// Fetches a single ICDX event.
pub struct GetEventFunction {
    /// Request/response client.
    invoker: Arc<dyn FunctionInvoker>,
    /// Broker settings used for every call.
    config: ConnectionConfig,
}

impl GetEventFunction {
    /// Creates the function from an invoker and broker settings.
    pub fn new(invoker: Arc<dyn FunctionInvoker>, config: ConnectionConfig) -> Self {
        Self {
            invoker,
            config,
        }
    }

    /// Builds the request payload for a UUID.
    #[must_use]
    pub fn payload(uuid: &str) -> String {
        json!({"id": GET_EVENT_ID, "uuid": uuid}).to_string()
    }

    /// Runs the function against workflow inputs.
    ///
    /// # Errors
    ///
    /// Returns [`FunctionError`] when `icdx_uuid` is missing, not a string, or
    /// blank. Facade failures are reported as unsuccessful results instead.
    pub fn run(&self, inputs: &Map<String, Value>) -> Result<FunctionResult, FunctionError> {
        let uuid = read_uuid(inputs)?;
        let payload = Self::payload(uuid);
        let result = match self.invoker.invoke(&payload, GET_EVENT_OPERATION, &self.config) {
            Ok(response) => {
                let (value, status_code) = response.into_parts();
                FunctionResult {
                    value: Value::Object(value),
                    status_code: Some(status_code),
                }
            }
            Err(err) => failure_result(&err),
        };
        Ok(result)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads the UUID input without checking its format.
fn read_uuid(inputs: &Map<String, Value>) -> Result<&str, FunctionError> {
    let value =
        inputs.get(UUID_INPUT).ok_or_else(|| FunctionError::MissingInput(UUID_INPUT.to_string()))?;
    let Value::String(uuid) = value else {
        return Err(FunctionError::InvalidInput {
            name: UUID_INPUT.to_string(),
            reason: "must be a string".to_string(),
        });
    };
    if uuid.trim().is_empty() {
        return Err(FunctionError::InvalidInput {
            name: UUID_INPUT.to_string(),
            reason: "must be non-empty".to_string(),
        });
    }
    Ok(uuid)
}

/// Shapes a facade failure as an unsuccessful result.
fn failure_result(err: &FacadeError) -> FunctionResult {
    FunctionResult {
        value: json!({
            "success": false,
            "reason": err.kind(),
            "message": err.to_string(),
        }),
        status_code: None,
    }
}
