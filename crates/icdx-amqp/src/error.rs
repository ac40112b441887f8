// crates/icdx-amqp/src/error.rs
// ============================================================================
// Module: ICDX AMQP Errors
// Description: Error taxonomy for the AMQP request/response facade.
// Purpose: Keep configuration, connection, timeout, and protocol failures distinct.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`FacadeError`] separates failures that happen before any network I/O
//! (configuration) from broker failures (connection), missing replies
//! (timeout), and undecodable replies (protocol).
//! Invariants:
//! - Variants and their [`FacadeError::kind`] labels are stable for audit records.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Facade Errors
// ============================================================================

/// Errors returned by the AMQP facade.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FacadeError {
    /// Required connection parameter or request field is missing or invalid.
    #[error("invalid amqp configuration: {0}")]
    Configuration(String),
    /// Broker was unreachable, rejected authentication, or dropped the channel.
    #[error("amqp connection failure: {0}")]
    Connection(String),
    /// No correlated reply arrived within the configured bound.
    #[error("no reply within {timeout_ms} ms")]
    Timeout {
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },
    /// Reply body could not be decoded into a result mapping.
    #[error("amqp protocol error: {0}")]
    Protocol(String),
}

impl FacadeError {
    /// Returns a stable label for audit records and function results.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Connection(_) => "connection",
            Self::Timeout {
                ..
            } => "timeout",
            Self::Protocol(_) => "protocol",
        }
    }

    /// Returns true when the caller may reasonably retry the call.
    ///
    /// The facade never retries on its own.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection(_)
                | Self::Timeout {
                    ..
                }
        )
    }
}
