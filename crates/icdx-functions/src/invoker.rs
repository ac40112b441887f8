// crates/icdx-functions/src/invoker.rs
// ============================================================================
// Module: Function Invoker
// Description: Seam between workflow functions and the AMQP facade.
// Purpose: Let functions run against any request/response implementation.
// Dependencies: icdx-amqp
// ============================================================================

//! ## Overview
//! [`FunctionInvoker`] is the single call a workflow function needs. The
//! facade implements it directly; tests may substitute their own.

use icdx_amqp::AmqpFacade;
use icdx_amqp::CallResponse;
use icdx_amqp::ConnectionConfig;
use icdx_amqp::FacadeError;

/// Sends one request and returns the decoded reply.
pub trait FunctionInvoker: Send + Sync {
    /// Publishes `payload` for `operation` using `config`.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError`] when the round trip fails.
    fn invoke(
        &self,
        payload: &str,
        operation: &str,
        config: &ConnectionConfig,
    ) -> Result<CallResponse, FacadeError>;
}

impl FunctionInvoker for AmqpFacade {
    fn invoke(
        &self,
        payload: &str,
        operation: &str,
        config: &ConnectionConfig,
    ) -> Result<CallResponse, FacadeError> {
        self.call(payload, operation, config)
    }
}
