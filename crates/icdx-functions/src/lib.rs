// crates/icdx-functions/src/lib.rs
// ============================================================================
// Module: ICDX Functions Library
// Description: Workflow functions backed by the ICDX AMQP facade.
// Purpose: Turn workflow inputs into facade calls and shape their results.
// Dependencies: icdx-amqp, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Each workflow function reads its named inputs, builds an ICDX request,
//! sends it through a [`FunctionInvoker`], and reports a [`FunctionResult`].
//! Facade failures become unsuccessful results rather than errors so the
//! calling workflow always receives a `success` flag.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod get_event;
pub mod invoker;
pub mod result;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use get_event::FUNCTION_NAME;
pub use get_event::GET_EVENT_ID;
pub use get_event::GET_EVENT_OPERATION;
pub use get_event::GetEventFunction;
pub use get_event::UUID_INPUT;
pub use invoker::FunctionInvoker;
pub use result::FunctionError;
pub use result::FunctionResult;
