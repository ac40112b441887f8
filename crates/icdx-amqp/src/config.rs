// crates/icdx-amqp/src/config.rs
// ============================================================================
// Module: ICDX AMQP Connection Config
// Description: Fully resolved broker connection parameters for one call.
// Purpose: Fail fast on missing parameters before any broker I/O.
// Dependencies: std
// ============================================================================

//! ## Overview
//! [`ConnectionConfig`] is the resolved value threaded into every facade call.
//! It is produced by an external configuration collaborator (see the
//! `icdx-config` crate) and re-validated by the facade before connecting.
//! Invariants:
//! - A config that passes [`ConnectionConfig::validate`] names a host, a
//!   non-zero port, a user, a routing key, and non-zero timeouts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use crate::error::FacadeError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Placeholder substituted with the operation name in routing keys.
pub const OPERATION_PLACEHOLDER: &str = "{operation}";
/// Default AMQP port.
pub const DEFAULT_AMQP_PORT: u16 = 5672;

// ============================================================================
// SECTION: Connection Config
// ============================================================================

/// Resolved broker connection parameters.
///
/// # Invariants
/// - `timeout` bounds the wait for the correlated reply only.
/// - `connect_timeout` bounds connection establishment only.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Broker host name or address.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Broker user name.
    pub username: String,
    /// Broker password.
    pub password: String,
    /// Broker virtual host.
    pub vhost: String,
    /// Exchange used for publishing (empty selects the default exchange).
    pub exchange: String,
    /// Routing key; may contain [`OPERATION_PLACEHOLDER`].
    pub routing_key: String,
    /// Upper bound on the wait for the correlated reply.
    pub timeout: Duration,
    /// Upper bound on connection establishment.
    pub connect_timeout: Duration,
}

impl ConnectionConfig {
    /// Validates that every required parameter is present.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::Configuration`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), FacadeError> {
        require_text("host", &self.host)?;
        require_text("username", &self.username)?;
        require_text("vhost", &self.vhost)?;
        require_text("routing_key", &self.routing_key)?;
        if self.port == 0 {
            return Err(FacadeError::Configuration("port must be non-zero".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(FacadeError::Configuration("timeout must be non-zero".to_string()));
        }
        if self.connect_timeout.is_zero() {
            return Err(FacadeError::Configuration(
                "connect_timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the routing key for an operation.
    #[must_use]
    pub fn routing_key_for(&self, operation: &str) -> String {
        self.routing_key.replace(OPERATION_PLACEHOLDER, operation)
    }

    /// Returns the reply timeout in whole milliseconds, saturating.
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("vhost", &self.vhost)
            .field("exchange", &self.exchange)
            .field("routing_key", &self.routing_key)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Rejects empty or whitespace-only values.
fn require_text(field: &str, value: &str) -> Result<(), FacadeError> {
    if value.trim().is_empty() {
        return Err(FacadeError::Configuration(format!("{field} must be non-empty")));
    }
    Ok(())
}
