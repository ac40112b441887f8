// crates/icdx-amqp/src/facade.rs
// ============================================================================
// Module: ICDX AMQP Facade
// Description: Blocking request/response client over a message broker.
// Purpose: Publish one correlated request and return its decoded reply.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! [`AmqpFacade`] runs the linear call sequence: validate, connect, open a
//! channel, declare the reply queue, publish, wait for the correlated reply,
//! decode, and release. The broker, clock, and audit sink are injected through
//! [`AmqpFacadeBuilder`].
//! Invariants:
//! - Validation failures happen before any broker I/O.
//! - The channel is released before the connection, on every exit path.
//! - Deliveries carrying a foreign correlation id are discarded.
//! - Exactly one audit event is recorded per call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use crate::audit::AmqpCallEvent;
use crate::audit::AmqpCallEventParams;
use crate::audit::AuditSink;
use crate::audit::NoopAuditSink;
use crate::clock::Clock;
use crate::clock::SystemClock;
use crate::config::ConnectionConfig;
use crate::correlation::CorrelationIdGenerator;
use crate::correlation::DEFAULT_CORRELATION_PREFIX;
use crate::error::FacadeError;
use crate::message::CallRequest;
use crate::message::CallResponse;
use crate::message::Delivery;
use crate::message::OutboundMessage;
use crate::transport::BrokerChannel;
use crate::transport::BrokerConnection;
use crate::transport::BrokerConnector;
use crate::transport::Lease;

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder for an AMQP facade.
///
/// # Invariants
/// - `build` succeeds only when a connector is configured.
#[derive(Default)]
pub struct AmqpFacadeBuilder {
    /// Connector used to open one connection per call.
    connector: Option<Arc<dyn BrokerConnector>>,
    /// Time source for deadlines and latency.
    clock: Option<Arc<dyn Clock>>,
    /// Sink receiving one event per call.
    audit: Option<Arc<dyn AuditSink>>,
    /// Prefix for issued correlation ids.
    correlation_prefix: Option<&'static str>,
}

impl AmqpFacadeBuilder {
    /// Sets the broker connector.
    #[must_use]
    pub fn connector(mut self, connector: impl BrokerConnector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Sets a shared broker connector.
    #[must_use]
    pub fn shared_connector(mut self, connector: Arc<dyn BrokerConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Sets the clock (defaults to [`SystemClock`]).
    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Sets the audit sink (defaults to [`NoopAuditSink`]).
    #[must_use]
    pub fn audit(mut self, audit: impl AuditSink + 'static) -> Self {
        self.audit = Some(Arc::new(audit));
        self
    }

    /// Sets a shared audit sink.
    #[must_use]
    pub fn shared_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Sets the correlation id prefix (defaults to `icdx`).
    #[must_use]
    pub const fn correlation_prefix(mut self, prefix: &'static str) -> Self {
        self.correlation_prefix = Some(prefix);
        self
    }

    /// Builds the facade.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::Configuration`] when no connector is configured.
    pub fn build(self) -> Result<AmqpFacade, FacadeError> {
        let connector = self.connector.ok_or_else(|| {
            FacadeError::Configuration("facade connector is not configured".to_string())
        })?;
        Ok(AmqpFacade {
            connector,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            audit: self.audit.unwrap_or_else(|| Arc::new(NoopAuditSink)),
            correlation: CorrelationIdGenerator::new(
                self.correlation_prefix.unwrap_or(DEFAULT_CORRELATION_PREFIX),
            ),
        })
    }
}

// ============================================================================
// SECTION: Facade
// ============================================================================

/// Synchronous request/response client over a message broker.
///
/// # Invariants
/// - Holds no per-call state; concurrent calls use independent connections.
pub struct AmqpFacade {
    /// Connector used to open one connection per call.
    connector: Arc<dyn BrokerConnector>,
    /// Time source for deadlines and latency.
    clock: Arc<dyn Clock>,
    /// Sink receiving one event per call.
    audit: Arc<dyn AuditSink>,
    /// Correlation id generator.
    correlation: CorrelationIdGenerator,
}

/// Per-call bookkeeping reported in the audit event.
#[derive(Debug, Default)]
struct CallTrace {
    /// Reply body size in bytes.
    response_bytes: usize,
    /// First failure reported while releasing resources.
    release_error: Option<String>,
}

impl CallTrace {
    /// Records a release failure, keeping the first one.
    fn note_release(&mut self, result: Result<(), FacadeError>) {
        if let Err(err) = result
            && self.release_error.is_none()
        {
            self.release_error = Some(err.to_string());
        }
    }
}

impl AmqpFacade {
    /// Returns a builder for the facade.
    #[must_use]
    pub fn builder() -> AmqpFacadeBuilder {
        AmqpFacadeBuilder::default()
    }

    /// Creates a facade with the system clock and no audit output.
    pub fn new(connector: impl BrokerConnector + 'static) -> Self {
        Self {
            connector: Arc::new(connector),
            clock: Arc::new(SystemClock),
            audit: Arc::new(NoopAuditSink),
            correlation: CorrelationIdGenerator::default(),
        }
    }

    /// Publishes `payload` for `operation` and waits for the correlated reply.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError`] when the request is invalid, the broker fails,
    /// no reply arrives in time, or the reply cannot be decoded.
    pub fn call(
        &self,
        payload: &str,
        operation: &str,
        config: &ConnectionConfig,
    ) -> Result<CallResponse, FacadeError> {
        self.execute(&CallRequest::new(payload, operation, config.clone()))
    }

    /// Executes a prepared request.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError`] as described for [`AmqpFacade::call`].
    pub fn execute(&self, request: &CallRequest) -> Result<CallResponse, FacadeError> {
        let started = self.clock.now();
        let correlation_id = self.correlation.issue();
        let mut trace = CallTrace::default();
        let outcome = request
            .validate()
            .and_then(|()| self.round_trip(request, &correlation_id, &mut trace));
        let elapsed = self.clock.now().saturating_duration_since(started);
        self.audit.record(&AmqpCallEvent::new(AmqpCallEventParams {
            operation: request.operation.clone(),
            correlation_id,
            status_code: outcome.as_ref().ok().map(CallResponse::status_code),
            error_kind: outcome.as_ref().err().map(FacadeError::kind),
            request_bytes: request.payload.len(),
            response_bytes: trace.response_bytes,
            elapsed_ms: elapsed.as_millis(),
            release_error: trace.release_error,
        }));
        outcome
    }

    /// Runs the call against a leased connection.
    fn round_trip(
        &self,
        request: &CallRequest,
        correlation_id: &str,
        trace: &mut CallTrace,
    ) -> Result<CallResponse, FacadeError> {
        let mut connection = Lease::new(self.connector.connect(&request.config)?);
        let outcome = self.exchange(connection.get_mut(), request, correlation_id, trace);
        trace.note_release(connection.release());
        outcome
    }

    /// Runs the call against a leased channel.
    fn exchange(
        &self,
        connection: &mut dyn BrokerConnection,
        request: &CallRequest,
        correlation_id: &str,
        trace: &mut CallTrace,
    ) -> Result<CallResponse, FacadeError> {
        let mut channel = Lease::new(connection.open_channel()?);
        let outcome = self.publish_and_await(channel.get_mut(), request, correlation_id, trace);
        trace.note_release(channel.release());
        outcome
    }

    /// Publishes the request and decodes the correlated reply.
    fn publish_and_await(
        &self,
        channel: &mut dyn BrokerChannel,
        request: &CallRequest,
        correlation_id: &str,
        trace: &mut CallTrace,
    ) -> Result<CallResponse, FacadeError> {
        let reply_to = channel.declare_reply_queue()?;
        let message = OutboundMessage {
            exchange: request.config.exchange.clone(),
            routing_key: request.config.routing_key_for(&request.operation),
            operation: request.operation.clone(),
            correlation_id: correlation_id.to_string(),
            reply_to,
            body: request.payload.as_bytes().to_vec(),
        };
        channel.publish(&message)?;
        let delivery = self.await_reply(channel, correlation_id, &request.config)?;
        trace.response_bytes = delivery.body.len();
        CallResponse::decode(&delivery.body)
    }

    /// Blocks until a delivery answers `correlation_id` or the timeout elapses.
    fn await_reply(
        &self,
        channel: &mut dyn BrokerChannel,
        correlation_id: &str,
        config: &ConnectionConfig,
    ) -> Result<Delivery, FacadeError> {
        let timed_out = || FacadeError::Timeout {
            timeout_ms: config.timeout_ms(),
        };
        let started = self.clock.now();
        loop {
            let waited = self.clock.now().saturating_duration_since(started);
            let remaining = config.timeout.saturating_sub(waited);
            if remaining == Duration::ZERO {
                return Err(timed_out());
            }
            match channel.next_delivery(remaining)? {
                Some(delivery) if delivery.answers(correlation_id) => return Ok(delivery),
                Some(_) => {}
                None => return Err(timed_out()),
            }
        }
    }
}
