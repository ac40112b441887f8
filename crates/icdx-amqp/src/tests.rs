// crates/icdx-amqp/src/tests.rs
// ============================================================================
// Module: Facade Unit Tests
// Description: Unit tests for facade sequencing, leases, and reply waiting.
// Purpose: Validate cleanup ordering and deadline handling with scripted fakes.
// Dependencies: icdx-amqp
// ============================================================================

//! ## Overview
//! Drives [`crate::AmqpFacade`] through a scripted transport and a manual clock
//! to check release ordering, stray-delivery handling, and deadlines.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use crate::AmqpFacade;
use crate::BrokerChannel;
use crate::BrokerConnection;
use crate::BrokerConnector;
use crate::CallStatus;
use crate::Clock;
use crate::ConnectionConfig;
use crate::Delivery;
use crate::FacadeError;
use crate::MemoryAuditSink;
use crate::OutboundMessage;
use crate::Release;
use crate::transport::Lease;

// ============================================================================
// SECTION: Fakes
// ============================================================================

/// Clock advanced explicitly by the test transport.
#[derive(Clone)]
struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap()
    }
}

/// Script step returned by the fake channel.
#[derive(Clone)]
enum Step {
    /// Deliver after consuming `elapsed` of clock time.
    Deliver(Delivery, Duration),
    /// Reply to the last published request with this body.
    Reply(String),
    /// Let the whole wait elapse.
    Elapse,
}

#[derive(Clone)]
struct ScriptedConnector {
    log: Arc<Mutex<Vec<String>>>,
    clock: ManualClock,
    script: Arc<Mutex<VecDeque<Step>>>,
    fail_channel_close: bool,
    published: Arc<Mutex<Vec<OutboundMessage>>>,
}

impl ScriptedConnector {
    fn new(clock: ManualClock, script: Vec<Step>) -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            clock,
            script: Arc::new(Mutex::new(script.into())),
            fail_channel_close: false,
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn push(&self, entry: &str) {
        self.log.lock().unwrap().push(entry.to_string());
    }
}

struct ScriptedConnection {
    connector: ScriptedConnector,
}

struct ScriptedChannel {
    connector: ScriptedConnector,
}

impl BrokerConnector for ScriptedConnector {
    fn connect(&self, _config: &ConnectionConfig) -> Result<Box<dyn BrokerConnection>, FacadeError> {
        self.push("connect");
        Ok(Box::new(ScriptedConnection {
            connector: self.clone(),
        }))
    }
}

impl Release for ScriptedConnection {
    fn release(&mut self) -> Result<(), FacadeError> {
        self.connector.push("close-connection");
        Ok(())
    }
}

impl BrokerConnection for ScriptedConnection {
    fn open_channel(&mut self) -> Result<Box<dyn BrokerChannel>, FacadeError> {
        self.connector.push("open-channel");
        Ok(Box::new(ScriptedChannel {
            connector: self.connector.clone(),
        }))
    }
}

impl Release for ScriptedChannel {
    fn release(&mut self) -> Result<(), FacadeError> {
        self.connector.push("close-channel");
        if self.connector.fail_channel_close {
            return Err(FacadeError::Connection("channel already closed".to_string()));
        }
        Ok(())
    }
}

impl BrokerChannel for ScriptedChannel {
    fn declare_reply_queue(&mut self) -> Result<String, FacadeError> {
        self.connector.push("declare");
        Ok("reply-q".to_string())
    }

    fn publish(&mut self, message: &OutboundMessage) -> Result<(), FacadeError> {
        self.connector.push("publish");
        self.connector.published.lock().unwrap().push(message.clone());
        Ok(())
    }

    fn next_delivery(&mut self, wait: Duration) -> Result<Option<Delivery>, FacadeError> {
        self.connector.push("wait");
        let step = self.connector.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Deliver(delivery, elapsed)) => {
                self.connector.clock.advance(elapsed);
                Ok(Some(delivery))
            }
            Some(Step::Reply(body)) => {
                let published = self.connector.published.lock().unwrap();
                let correlation_id = published.last().map(|message| message.correlation_id.clone());
                drop(published);
                Ok(Some(Delivery {
                    correlation_id,
                    body: body.into_bytes(),
                }))
            }
            Some(Step::Elapse) | None => {
                self.connector.clock.advance(wait);
                Ok(None)
            }
        }
    }
}

/// Lease target counting releases.
struct Counted(Arc<Mutex<usize>>);

impl Release for Counted {
    fn release(&mut self) -> Result<(), FacadeError> {
        *self.0.lock().unwrap() += 1;
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn config() -> ConnectionConfig {
    ConnectionConfig {
        host: "broker.local".to_string(),
        port: 5672,
        username: "icdx".to_string(),
        password: "secret".to_string(),
        vhost: "/".to_string(),
        exchange: "icdx".to_string(),
        routing_key: "icdx.{operation}".to_string(),
        timeout: Duration::from_secs(10),
        connect_timeout: Duration::from_secs(1),
    }
}

/// Builds a delivery answering the first published message.
fn reply_for(connector: &ScriptedConnector, body: &str) -> Delivery {
    let published = connector.published.lock().unwrap();
    Delivery {
        correlation_id: Some(published[0].correlation_id.clone()),
        body: body.as_bytes().to_vec(),
    }
}

fn facade(connector: &ScriptedConnector, clock: &ManualClock) -> AmqpFacade {
    AmqpFacade::builder().connector(connector.clone()).clock(clock.clone()).build().unwrap()
}

// ============================================================================
// SECTION: Lease Tests
// ============================================================================

#[test]
fn lease_releases_on_drop() {
    let count = Arc::new(Mutex::new(0));
    {
        let _lease = Lease::new(Box::new(Counted(Arc::clone(&count))));
    }
    assert_eq!(*count.lock().unwrap(), 1);
}

#[test]
fn lease_explicit_release_is_not_repeated_on_drop() {
    let count = Arc::new(Mutex::new(0));
    let lease = Lease::new(Box::new(Counted(Arc::clone(&count))));
    lease.release().unwrap();
    assert_eq!(*count.lock().unwrap(), 1);
}

// ============================================================================
// SECTION: Sequencing Tests
// ============================================================================

#[test]
fn call_timeout_releases_channel_then_connection() {
    let clock = ManualClock::new();
    let connector = ScriptedConnector::new(clock.clone(), vec![Step::Elapse]);
    let err = facade(&connector, &clock).call("{\"id\":0}", "get_event", &config()).unwrap_err();
    assert_eq!(
        err,
        FacadeError::Timeout {
            timeout_ms: 10_000
        }
    );
    assert_eq!(
        connector.log(),
        vec![
            "connect",
            "open-channel",
            "declare",
            "publish",
            "wait",
            "close-channel",
            "close-connection"
        ]
    );
}

#[test]
fn call_publishes_with_routing_and_reply_queue() {
    let clock = ManualClock::new();
    let connector = ScriptedConnector::new(clock.clone(), vec![Step::Elapse]);
    let _ = facade(&connector, &clock).call("{\"id\":0}", "get_event", &config());
    let published = connector.published.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].exchange, "icdx");
    assert_eq!(published[0].routing_key, "icdx.get_event");
    assert_eq!(published[0].operation, "get_event");
    assert_eq!(published[0].reply_to, "reply-q");
    assert_eq!(published[0].body, b"{\"id\":0}".to_vec());
    assert!(published[0].correlation_id.starts_with("icdx-"));
}

#[test]
fn stray_deliveries_are_skipped_until_match() {
    let clock = ManualClock::new();
    let stray = Delivery {
        correlation_id: Some("someone-else".to_string()),
        body: b"{\"success\":false}".to_vec(),
    };
    let uncorrelated = Delivery {
        correlation_id: None,
        body: b"{\"success\":false}".to_vec(),
    };
    let connector = ScriptedConnector::new(
        clock.clone(),
        vec![
            Step::Deliver(stray, Duration::from_secs(1)),
            Step::Deliver(uncorrelated, Duration::from_secs(1)),
            Step::Reply("{\"success\":true,\"uuid\":\"u\"}".to_string()),
        ],
    );
    let response = facade(&connector, &clock)
        .call("{\"id\":0,\"uuid\":\"u\"}", "get_event", &config())
        .unwrap();
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.result["uuid"], "u");
    assert_eq!(connector.log().iter().filter(|entry| *entry == "wait").count(), 3);
}

#[test]
fn stale_reply_from_previous_call_is_ignored() {
    let clock = ManualClock::new();
    let connector = ScriptedConnector::new(clock.clone(), vec![Step::Elapse]);
    let facade = facade(&connector, &clock);
    let config = config();
    assert!(facade.call("{}", "get_event", &config).is_err());
    let stale = reply_for(&connector, "{\"success\":true}");
    connector.script.lock().unwrap().push_back(Step::Deliver(stale, Duration::from_millis(10)));
    let second = facade.call("{}", "get_event", &config);
    assert!(matches!(second, Err(FacadeError::Timeout { .. })));
}

#[test]
fn deadline_counts_time_spent_on_strays() {
    let clock = ManualClock::new();
    let strays = (0 .. 5)
        .map(|_| {
            Step::Deliver(
                Delivery {
                    correlation_id: Some("other".to_string()),
                    body: Vec::new(),
                },
                Duration::from_secs(3),
            )
        })
        .collect();
    let connector = ScriptedConnector::new(clock.clone(), strays);
    let err = facade(&connector, &clock).call("{}", "get_event", &config()).unwrap_err();
    assert!(matches!(err, FacadeError::Timeout { .. }));
    // 10 s budget at 3 s per stray: four waits exhaust it.
    assert_eq!(connector.log().iter().filter(|entry| *entry == "wait").count(), 4);
}

#[test]
fn release_failure_is_audited_without_masking_outcome() {
    let clock = ManualClock::new();
    let mut connector = ScriptedConnector::new(clock.clone(), vec![Step::Elapse]);
    connector.fail_channel_close = true;
    let audit = Arc::new(MemoryAuditSink::new());
    let facade = AmqpFacade::builder()
        .connector(connector.clone())
        .clock(clock)
        .shared_audit(Arc::clone(&audit) as Arc<dyn crate::AuditSink>)
        .build()
        .unwrap();
    let err = facade.call("{}", "get_event", &config()).unwrap_err();
    assert!(matches!(err, FacadeError::Timeout { .. }));
    let events = audit.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].error_kind, Some("timeout"));
    assert!(events[0].release_error.as_deref().unwrap().contains("channel already closed"));
    assert!(connector.log().contains(&"close-connection".to_string()));
}

#[test]
fn invalid_request_never_connects() {
    let clock = ManualClock::new();
    let connector = ScriptedConnector::new(clock.clone(), Vec::new());
    let err = facade(&connector, &clock).call("not json", "get_event", &config()).unwrap_err();
    assert_eq!(err.kind(), "configuration");
    assert!(connector.log().is_empty());
}

#[test]
fn status_codes_are_200_and_204() {
    assert_eq!(CallStatus::from_success(true).code(), 200);
    assert_eq!(CallStatus::from_success(false).code(), 204);
}
