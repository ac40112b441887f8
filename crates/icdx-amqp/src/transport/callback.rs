// crates/icdx-amqp/src/transport/callback.rs
// ============================================================================
// Module: ICDX Callback Transport
// Description: In-memory broker answering requests with a user function.
// Purpose: Run the facade without a broker (tests, dry runs, embedding).
// Dependencies: serde_json, std
// ============================================================================

//! ## Overview
//! [`CallbackConnector`] answers every published request by invoking a
//! user-supplied handler. Replies are queued on the channel and handed out by
//! [`BrokerChannel::next_delivery`]; an empty queue behaves like an elapsed
//! wait. [`ConnectionStats`] counts opens, closes, and publishes so callers can
//! verify resource cleanup.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::Map;
use serde_json::Value;

use crate::config::ConnectionConfig;
use crate::error::FacadeError;
use crate::message::Delivery;
use crate::message::OutboundMessage;
use crate::message::SUCCESS_FIELD;
use crate::transport::BrokerChannel;
use crate::transport::BrokerConnection;
use crate::transport::BrokerConnector;
use crate::transport::Release;

// ============================================================================
// SECTION: Replies
// ============================================================================

/// Handler decision for one published request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackReply {
    /// Reply with this body, correlated to the request.
    Respond(Vec<u8>),
    /// Queue these deliveries verbatim, whatever their correlation ids.
    Deliveries(Vec<Delivery>),
    /// Publish succeeds but no reply is ever queued.
    Silent,
}

impl CallbackReply {
    /// Replies with a serialized JSON value.
    #[must_use]
    pub fn json(value: &Value) -> Self {
        Self::Respond(value.to_string().into_bytes())
    }
}

/// Handler signature used by the connector.
type ReplyHandler = dyn Fn(&OutboundMessage) -> Result<CallbackReply, FacadeError> + Send + Sync;

// ============================================================================
// SECTION: Stats
// ============================================================================

/// Resource counters shared by every connection of a connector.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Connections opened.
    connections_opened: AtomicUsize,
    /// Connections released.
    connections_closed: AtomicUsize,
    /// Channels opened.
    channels_opened: AtomicUsize,
    /// Channels released.
    channels_closed: AtomicUsize,
    /// Messages published.
    published: AtomicUsize,
}

impl ConnectionStats {
    /// Returns the number of connections opened.
    #[must_use]
    pub fn connections_opened(&self) -> usize {
        self.connections_opened.load(Ordering::SeqCst)
    }

    /// Returns the number of connections released.
    #[must_use]
    pub fn connections_closed(&self) -> usize {
        self.connections_closed.load(Ordering::SeqCst)
    }

    /// Returns the number of channels opened.
    #[must_use]
    pub fn channels_opened(&self) -> usize {
        self.channels_opened.load(Ordering::SeqCst)
    }

    /// Returns the number of channels released.
    #[must_use]
    pub fn channels_closed(&self) -> usize {
        self.channels_closed.load(Ordering::SeqCst)
    }

    /// Returns the number of messages published.
    #[must_use]
    pub fn published(&self) -> usize {
        self.published.load(Ordering::SeqCst)
    }

    /// Returns true when every opened connection and channel was released.
    #[must_use]
    pub fn all_released(&self) -> bool {
        self.connections_opened() == self.connections_closed()
            && self.channels_opened() == self.channels_closed()
    }
}

// ============================================================================
// SECTION: Callback Connector
// ============================================================================

/// In-memory connector driven by a reply handler.
#[derive(Clone)]
pub struct CallbackConnector {
    /// Handler invoked for each published request.
    handler: Arc<ReplyHandler>,
    /// Shared resource counters.
    stats: Arc<ConnectionStats>,
    /// Connection failure reported instead of connecting, when set.
    refusal: Option<String>,
}

impl CallbackConnector {
    /// Creates a connector from a reply handler.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&OutboundMessage) -> Result<CallbackReply, FacadeError> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            stats: Arc::new(ConnectionStats::default()),
            refusal: None,
        }
    }

    /// Creates a connector that echoes the request fields with `success` set.
    ///
    /// Object requests are echoed field by field; other JSON values are
    /// nested under `request`.
    #[must_use]
    pub fn echo(success: bool) -> Self {
        Self::new(move |message| {
            let request = serde_json::from_slice::<Value>(&message.body)
                .map_err(|err| FacadeError::Protocol(format!("request is not json: {err}")))?;
            let mut reply = match request {
                Value::Object(fields) => fields,
                other => {
                    let mut fields = Map::new();
                    fields.insert("request".to_string(), other);
                    fields
                }
            };
            reply.insert(SUCCESS_FIELD.to_string(), Value::Bool(success));
            Ok(CallbackReply::json(&Value::Object(reply)))
        })
    }

    /// Creates a connector whose every connection attempt fails.
    #[must_use]
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            refusal: Some(reason.into()),
            ..Self::new(|_| Ok(CallbackReply::Silent))
        }
    }

    /// Returns the shared resource counters.
    #[must_use]
    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }
}

impl BrokerConnector for CallbackConnector {
    fn connect(
        &self,
        _config: &ConnectionConfig,
    ) -> Result<Box<dyn BrokerConnection>, FacadeError> {
        if let Some(reason) = &self.refusal {
            return Err(FacadeError::Connection(reason.clone()));
        }
        self.stats.connections_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CallbackConnection {
            handler: Arc::clone(&self.handler),
            stats: Arc::clone(&self.stats),
        }))
    }
}

// ============================================================================
// SECTION: Connection And Channel
// ============================================================================

/// Connection handed out by [`CallbackConnector`].
struct CallbackConnection {
    /// Handler invoked for each published request.
    handler: Arc<ReplyHandler>,
    /// Shared resource counters.
    stats: Arc<ConnectionStats>,
}

impl Release for CallbackConnection {
    fn release(&mut self) -> Result<(), FacadeError> {
        self.stats.connections_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl BrokerConnection for CallbackConnection {
    fn open_channel(&mut self) -> Result<Box<dyn BrokerChannel>, FacadeError> {
        let sequence = self.stats.channels_opened.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Box::new(CallbackChannel {
            handler: Arc::clone(&self.handler),
            stats: Arc::clone(&self.stats),
            reply_queue: format!("amq.gen-callback-{sequence}"),
            pending: VecDeque::new(),
        }))
    }
}

/// Channel handed out by [`CallbackConnection`].
struct CallbackChannel {
    /// Handler invoked for each published request.
    handler: Arc<ReplyHandler>,
    /// Shared resource counters.
    stats: Arc<ConnectionStats>,
    /// Name of the reply queue.
    reply_queue: String,
    /// Replies waiting to be consumed.
    pending: VecDeque<Delivery>,
}

impl Release for CallbackChannel {
    fn release(&mut self) -> Result<(), FacadeError> {
        self.pending.clear();
        self.stats.channels_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl BrokerChannel for CallbackChannel {
    fn declare_reply_queue(&mut self) -> Result<String, FacadeError> {
        Ok(self.reply_queue.clone())
    }

    fn publish(&mut self, message: &OutboundMessage) -> Result<(), FacadeError> {
        let reply = (self.handler)(message)?;
        self.stats.published.fetch_add(1, Ordering::SeqCst);
        match reply {
            CallbackReply::Respond(body) => self.pending.push_back(Delivery {
                correlation_id: Some(message.correlation_id.clone()),
                body,
            }),
            CallbackReply::Deliveries(deliveries) => self.pending.extend(deliveries),
            CallbackReply::Silent => {}
        }
        Ok(())
    }

    fn next_delivery(&mut self, _wait: Duration) -> Result<Option<Delivery>, FacadeError> {
        Ok(self.pending.pop_front())
    }
}
