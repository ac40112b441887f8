// crates/icdx-amqp/src/transport/amqp.rs
// ============================================================================
// Module: ICDX Lapin Transport
// Description: AMQP 0-9-1 transport backed by the lapin client.
// Purpose: Connect, publish, and consume replies against a real broker.
// Dependencies: lapin, tokio, tokio-stream
// ============================================================================

//! ## Overview
//! [`LapinConnector`] drives the asynchronous lapin client from blocking code
//! through a private current-thread tokio runtime, so facade calls stay
//! synchronous for their callers.
//! Invariants:
//! - Connection establishment is bounded by `connect_timeout`.
//! - Each channel consumes an exclusive, auto-delete reply queue with `no_ack`.
//! - Waits for deliveries are bounded by the caller-supplied duration.
//!
//! Calls must not be issued from inside an async runtime; the connector blocks
//! the calling thread.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use lapin::BasicProperties;
use lapin::Channel;
use lapin::Connection;
use lapin::ConnectionProperties;
use lapin::Consumer;
use lapin::options::BasicConsumeOptions;
use lapin::options::BasicPublishOptions;
use lapin::options::QueueDeclareOptions;
use lapin::types::FieldTable;
use lapin::types::ShortString;
use lapin::uri::AMQPAuthority;
use lapin::uri::AMQPQueryString;
use lapin::uri::AMQPScheme;
use lapin::uri::AMQPUri;
use lapin::uri::AMQPUserInfo;
use tokio::runtime::Builder;
use tokio::runtime::Runtime;
use tokio_stream::StreamExt;

use crate::config::ConnectionConfig;
use crate::error::FacadeError;
use crate::message::Delivery;
use crate::message::JSON_CONTENT_TYPE;
use crate::message::OutboundMessage;
use crate::transport::BrokerChannel;
use crate::transport::BrokerConnection;
use crate::transport::BrokerConnector;
use crate::transport::Release;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// AMQP reply code for a normal close.
const REPLY_SUCCESS: u16 = 200;
/// Reply text sent on a normal close.
const REPLY_TEXT: &str = "OK";

// ============================================================================
// SECTION: Lapin Connector
// ============================================================================

/// Connector opening real AMQP connections.
///
/// # Invariants
/// - All connections share the connector's runtime.
#[derive(Clone)]
pub struct LapinConnector {
    /// Runtime used to drive lapin futures.
    runtime: Arc<Runtime>,
}

impl LapinConnector {
    /// Creates a connector with its own current-thread runtime.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::Connection`] when the runtime cannot be built.
    pub fn new() -> Result<Self, FacadeError> {
        let runtime = Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|err| FacadeError::Connection(format!("runtime init failed: {err}")))?;
        Ok(Self {
            runtime: Arc::new(runtime),
        })
    }
}

impl BrokerConnector for LapinConnector {
    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn BrokerConnection>, FacadeError> {
        let uri = amqp_uri(config);
        let connect_timeout = config.connect_timeout;
        let connection = self
            .runtime
            .block_on(async {
                tokio::time::timeout(
                    connect_timeout,
                    Connection::connect_uri(uri, ConnectionProperties::default()),
                )
                .await
            })
            .map_err(|_| {
                FacadeError::Connection(format!(
                    "connect to {}:{} timed out after {} ms",
                    config.host,
                    config.port,
                    connect_timeout.as_millis()
                ))
            })?
            .map_err(|err| FacadeError::Connection(err.to_string()))?;
        Ok(Box::new(LapinConnection {
            runtime: Arc::clone(&self.runtime),
            connection,
        }))
    }
}

/// Builds the broker URI from structured parts, avoiding string escaping.
fn amqp_uri(config: &ConnectionConfig) -> AMQPUri {
    let connect_timeout_ms = u64::try_from(config.connect_timeout.as_millis()).unwrap_or(u64::MAX);
    AMQPUri {
        scheme: AMQPScheme::AMQP,
        authority: AMQPAuthority {
            userinfo: AMQPUserInfo {
                username: config.username.clone(),
                password: config.password.clone(),
            },
            host: config.host.clone(),
            port: config.port,
        },
        vhost: config.vhost.clone(),
        query: AMQPQueryString {
            connection_timeout: Some(connect_timeout_ms),
            ..AMQPQueryString::default()
        },
    }
}

// ============================================================================
// SECTION: Connection
// ============================================================================

/// Open lapin connection.
struct LapinConnection {
    /// Runtime used to drive lapin futures.
    runtime: Arc<Runtime>,
    /// Underlying connection.
    connection: Connection,
}

impl Release for LapinConnection {
    fn release(&mut self) -> Result<(), FacadeError> {
        self.runtime
            .block_on(self.connection.close(REPLY_SUCCESS, REPLY_TEXT))
            .map_err(|err| FacadeError::Connection(format!("connection close failed: {err}")))
    }
}

impl BrokerConnection for LapinConnection {
    fn open_channel(&mut self) -> Result<Box<dyn BrokerChannel>, FacadeError> {
        let channel = self
            .runtime
            .block_on(self.connection.create_channel())
            .map_err(|err| FacadeError::Connection(format!("channel open failed: {err}")))?;
        Ok(Box::new(LapinChannel {
            runtime: Arc::clone(&self.runtime),
            channel,
            consumer: None,
        }))
    }
}

// ============================================================================
// SECTION: Channel
// ============================================================================

/// Open lapin channel with an optional reply consumer.
struct LapinChannel {
    /// Runtime used to drive lapin futures.
    runtime: Arc<Runtime>,
    /// Underlying channel.
    channel: Channel,
    /// Consumer on the reply queue once declared.
    consumer: Option<Consumer>,
}

impl Release for LapinChannel {
    fn release(&mut self) -> Result<(), FacadeError> {
        self.consumer = None;
        self.runtime
            .block_on(self.channel.close(REPLY_SUCCESS, REPLY_TEXT))
            .map_err(|err| FacadeError::Connection(format!("channel close failed: {err}")))
    }
}

impl BrokerChannel for LapinChannel {
    fn declare_reply_queue(&mut self) -> Result<String, FacadeError> {
        let channel = &self.channel;
        let (queue_name, consumer) = self
            .runtime
            .block_on(async {
                let queue = channel
                    .queue_declare(
                        "",
                        QueueDeclareOptions {
                            exclusive: true,
                            auto_delete: true,
                            ..QueueDeclareOptions::default()
                        },
                        FieldTable::default(),
                    )
                    .await?;
                let queue_name = queue.name().as_str().to_string();
                let consumer = channel
                    .basic_consume(
                        &queue_name,
                        "",
                        BasicConsumeOptions {
                            no_ack: true,
                            ..BasicConsumeOptions::default()
                        },
                        FieldTable::default(),
                    )
                    .await?;
                Ok::<_, lapin::Error>((queue_name, consumer))
            })
            .map_err(|err| FacadeError::Connection(format!("reply queue setup failed: {err}")))?;
        self.consumer = Some(consumer);
        Ok(queue_name)
    }

    fn publish(&mut self, message: &OutboundMessage) -> Result<(), FacadeError> {
        let properties = BasicProperties::default()
            .with_content_type(ShortString::from(JSON_CONTENT_TYPE))
            .with_correlation_id(ShortString::from(message.correlation_id.clone()))
            .with_reply_to(ShortString::from(message.reply_to.clone()))
            .with_kind(ShortString::from(message.operation.clone()));
        let channel = &self.channel;
        self.runtime
            .block_on(async {
                channel
                    .basic_publish(
                        &message.exchange,
                        &message.routing_key,
                        BasicPublishOptions::default(),
                        &message.body,
                        properties,
                    )
                    .await?
                    .await
            })
            .map(|_| ())
            .map_err(|err| FacadeError::Connection(format!("publish failed: {err}")))
    }

    fn next_delivery(&mut self, wait: Duration) -> Result<Option<Delivery>, FacadeError> {
        let Some(consumer) = self.consumer.as_mut() else {
            return Err(FacadeError::Connection("reply queue is not declared".to_string()));
        };
        let next = self.runtime.block_on(async { tokio::time::timeout(wait, consumer.next()).await });
        match next {
            Err(_) => Ok(None),
            Ok(None) => Err(FacadeError::Connection("reply consumer closed".to_string())),
            Ok(Some(Err(err))) => Err(FacadeError::Connection(format!("reply consume failed: {err}"))),
            Ok(Some(Ok(delivery))) => Ok(Some(Delivery {
                correlation_id: delivery
                    .properties
                    .correlation_id()
                    .as_ref()
                    .map(|id| id.as_str().to_string()),
                body: delivery.data,
            })),
        }
    }
}
