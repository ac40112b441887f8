// crates/icdx-amqp/src/message.rs
// ============================================================================
// Module: ICDX AMQP Messages
// Description: Request, reply, and wire message types for the facade.
// Purpose: Carry one request to the broker and decode its correlated reply.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! A [`CallRequest`] becomes one [`OutboundMessage`] on the wire. The matching
//! [`Delivery`] is decoded into a [`CallResponse`] whose [`CallStatus`] is
//! derived from the reply's boolean `success` field.
//! Invariants:
//! - Reply bodies must be JSON objects carrying a boolean `success` field.
//! - Only [`CallStatus::Success`] (200) and [`CallStatus::NoContent`] (204) exist.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::de::IgnoredAny;
use serde_json::Map;
use serde_json::Value;

use crate::config::ConnectionConfig;
use crate::error::FacadeError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Content type stamped on outbound request bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Reply field signalling remote success.
pub const SUCCESS_FIELD: &str = "success";

// ============================================================================
// SECTION: Request Types
// ============================================================================

/// One facade invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    /// Remote action name (for example `get_event`).
    pub operation: String,
    /// Serialized JSON request body.
    pub payload: String,
    /// Resolved connection parameters.
    pub config: ConnectionConfig,
}

impl CallRequest {
    /// Creates a request from its parts.
    pub fn new(
        payload: impl Into<String>,
        operation: impl Into<String>,
        config: ConnectionConfig,
    ) -> Self {
        Self {
            operation: operation.into(),
            payload: payload.into(),
            config,
        }
    }

    /// Checks the request fields that do not depend on the broker.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::Configuration`] when the config is incomplete,
    /// the operation is empty, or the payload is empty or not JSON.
    pub fn validate(&self) -> Result<(), FacadeError> {
        self.config.validate()?;
        if self.operation.trim().is_empty() {
            return Err(FacadeError::Configuration("operation must be non-empty".to_string()));
        }
        if self.payload.trim().is_empty() {
            return Err(FacadeError::Configuration("payload must be non-empty".to_string()));
        }
        serde_json::from_str::<IgnoredAny>(&self.payload)
            .map_err(|err| FacadeError::Configuration(format!("payload is not json: {err}")))?;
        Ok(())
    }
}

/// Message handed to a broker channel for publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Exchange to publish on.
    pub exchange: String,
    /// Routing key for the request.
    pub routing_key: String,
    /// Operation name (sent as the message type).
    pub operation: String,
    /// Correlation identifier the reply must echo.
    pub correlation_id: String,
    /// Queue the remote worker replies to.
    pub reply_to: String,
    /// Request body bytes.
    pub body: Vec<u8>,
}

/// Message received on the reply queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Correlation identifier carried by the reply, if any.
    pub correlation_id: Option<String>,
    /// Reply body bytes.
    pub body: Vec<u8>,
}

impl Delivery {
    /// Returns true when the delivery answers the given correlation id.
    #[must_use]
    pub fn answers(&self, correlation_id: &str) -> bool {
        self.correlation_id.as_deref() == Some(correlation_id)
    }
}

// ============================================================================
// SECTION: Response Types
// ============================================================================

/// Outcome code of a completed round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallStatus {
    /// Remote worker reported success.
    Success,
    /// Remote worker reported failure or had nothing to return.
    NoContent,
}

impl CallStatus {
    /// Maps the reply's `success` flag to a status.
    #[must_use]
    pub const fn from_success(success: bool) -> Self {
        if success { Self::Success } else { Self::NoContent }
    }

    /// Returns the numeric status code.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Success => 200,
            Self::NoContent => 204,
        }
    }
}

/// Decoded reply of a completed round trip.
///
/// # Invariants
/// - `result[SUCCESS_FIELD]` is a boolean consistent with `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResponse {
    /// Decoded reply mapping.
    pub result: Map<String, Value>,
    /// Status derived from the reply.
    pub status: CallStatus,
}

impl CallResponse {
    /// Decodes a reply body.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::Protocol`] when the body is not a JSON object or
    /// lacks a boolean `success` field.
    pub fn decode(body: &[u8]) -> Result<Self, FacadeError> {
        let value = serde_json::from_slice::<Value>(body)
            .map_err(|err| FacadeError::Protocol(format!("reply is not json: {err}")))?;
        let Value::Object(result) = value else {
            return Err(FacadeError::Protocol("reply is not a json object".to_string()));
        };
        let success = match result.get(SUCCESS_FIELD) {
            Some(Value::Bool(flag)) => *flag,
            Some(_) => {
                return Err(FacadeError::Protocol("reply success field is not a boolean".to_string()));
            }
            None => return Err(FacadeError::Protocol("reply is missing success field".to_string())),
        };
        Ok(Self {
            result,
            status: CallStatus::from_success(success),
        })
    }

    /// Returns the numeric status code (200 or 204).
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.status.code()
    }

    /// Returns true when the remote worker reported success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == CallStatus::Success
    }

    /// Splits the response into the `(result, status_code)` pair.
    #[must_use]
    pub fn into_parts(self) -> (Map<String, Value>, u16) {
        let code = self.status.code();
        (self.result, code)
    }
}
