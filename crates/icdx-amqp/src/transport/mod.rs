// crates/icdx-amqp/src/transport/mod.rs
// ============================================================================
// Module: ICDX AMQP Transports
// Description: Broker connection traits and reference implementations.
// Purpose: Decouple the facade from a concrete AMQP client.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A [`BrokerConnector`] opens one [`BrokerConnection`] per call; the
//! connection opens one [`BrokerChannel`] that declares a reply queue,
//! publishes the request, and yields deliveries. Both connection and channel
//! implement [`Release`] and are held in a scoped lease while in use.
//! Invariants:
//! - [`Release::release`] is invoked at most once per leased resource.
//! - A lease dropped without an explicit release still releases its resource.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use crate::config::ConnectionConfig;
use crate::error::FacadeError;
use crate::message::Delivery;
use crate::message::OutboundMessage;

// ============================================================================
// SECTION: Transport Traits
// ============================================================================

/// Broker resource that must be closed exactly once.
pub trait Release: Send {
    /// Closes the resource.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::Connection`] when the broker rejects the close.
    fn release(&mut self) -> Result<(), FacadeError>;
}

/// Opens broker connections.
pub trait BrokerConnector: Send + Sync {
    /// Opens a connection using the resolved config.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::Connection`] when the broker is unreachable or
    /// rejects the credentials.
    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn BrokerConnection>, FacadeError>;
}

/// Open broker connection owned by a single call.
pub trait BrokerConnection: Release {
    /// Opens a channel on the connection.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::Connection`] when the channel cannot be opened.
    fn open_channel(&mut self) -> Result<Box<dyn BrokerChannel>, FacadeError>;
}

/// Open broker channel owned by a single call.
pub trait BrokerChannel: Release {
    /// Declares an exclusive reply queue, starts consuming it, and returns its name.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::Connection`] when the declaration fails.
    fn declare_reply_queue(&mut self) -> Result<String, FacadeError>;

    /// Publishes the request message.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::Connection`] when the broker rejects the publish.
    fn publish(&mut self, message: &OutboundMessage) -> Result<(), FacadeError>;

    /// Waits up to `wait` for the next reply-queue delivery.
    ///
    /// Returns `Ok(None)` when the wait elapses without a delivery.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::Connection`] when the consumer fails.
    fn next_delivery(&mut self, wait: Duration) -> Result<Option<Delivery>, FacadeError>;
}

// ============================================================================
// SECTION: Scoped Lease
// ============================================================================

/// Scoped ownership of a broker resource.
pub(crate) struct Lease<T: Release + ?Sized> {
    /// Leased resource.
    inner: Box<T>,
    /// Whether the resource has been released.
    released: bool,
}

impl<T: Release + ?Sized> Lease<T> {
    /// Takes ownership of a resource.
    pub(crate) fn new(inner: Box<T>) -> Self {
        Self {
            inner,
            released: false,
        }
    }

    /// Returns the leased resource.
    pub(crate) fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Releases the resource, consuming the lease.
    pub(crate) fn release(mut self) -> Result<(), FacadeError> {
        self.released = true;
        self.inner.release()
    }
}

impl<T: Release + ?Sized> Drop for Lease<T> {
    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            let _ = self.inner.release();
        }
    }
}

// ============================================================================
// SECTION: Implementations
// ============================================================================

pub mod amqp;
pub mod callback;

pub use amqp::LapinConnector;
pub use callback::CallbackConnector;
pub use callback::CallbackReply;
pub use callback::ConnectionStats;
