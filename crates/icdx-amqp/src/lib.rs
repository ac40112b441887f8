// crates/icdx-amqp/src/lib.rs
// ============================================================================
// Module: ICDX AMQP Library
// Description: Synchronous AMQP request/response facade for ICDX operations.
// Purpose: Publish correlated requests and map remote replies to status codes.
// Dependencies: lapin, rand, serde_json, thiserror, tokio
// ============================================================================

//! ## Overview
//! ICDX AMQP provides the [`AmqpFacade`] used by workflow functions to delegate
//! an operation to a remote ICDX worker over a message broker. Broker access is
//! abstracted behind [`BrokerConnector`] so callers can swap the production
//! [`LapinConnector`] for the in-memory [`CallbackConnector`].
//! Invariants:
//! - Each call produces exactly one [`CallResponse`] or one [`FacadeError`].
//! - Status codes are limited to `200` (remote success) and `204` (remote failure).
//! - Connections and channels are released on every exit path.
//!
//! Security posture: reply bodies originate from remote workers and are treated
//! as untrusted input.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod clock;
pub mod config;
pub mod correlation;
pub mod error;
pub mod facade;
pub mod message;
pub mod transport;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AmqpCallEvent;
pub use audit::AmqpCallEventParams;
pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::MemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use clock::Clock;
pub use clock::SystemClock;
pub use config::ConnectionConfig;
pub use config::DEFAULT_AMQP_PORT;
pub use config::OPERATION_PLACEHOLDER;
pub use correlation::CorrelationIdGenerator;
pub use error::FacadeError;
pub use facade::AmqpFacade;
pub use facade::AmqpFacadeBuilder;
pub use message::CallRequest;
pub use message::CallResponse;
pub use message::CallStatus;
pub use message::Delivery;
pub use message::OutboundMessage;
pub use transport::BrokerChannel;
pub use transport::BrokerConnection;
pub use transport::BrokerConnector;
pub use transport::CallbackConnector;
pub use transport::CallbackReply;
pub use transport::ConnectionStats;
pub use transport::LapinConnector;
pub use transport::Release;

#[cfg(test)]
mod tests;
