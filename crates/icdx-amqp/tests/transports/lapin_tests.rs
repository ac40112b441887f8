// crates/icdx-amqp/tests/transports/lapin_tests.rs
// ============================================================================
// Module: Lapin Transport Tests
// Description: Failure-path tests for the lapin-backed transport.
// Purpose: Confirm connection failures surface as connection errors.
// Dependencies: icdx-amqp
// ============================================================================

//! ## Overview
//! Live-broker behavior is not covered here; these tests only need a closed
//! local port.

use std::net::TcpListener;
use std::time::Duration;

use icdx_amqp::AmqpFacade;
use icdx_amqp::BrokerConnector;
use icdx_amqp::LapinConnector;

use crate::common::sample_config;

/// Returns a local port with no listener bound to it.
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[test]
fn refused_connection_is_a_connection_error() {
    let connector = LapinConnector::new().unwrap();
    let mut config = sample_config();
    config.host = "127.0.0.1".to_string();
    config.port = closed_port();
    config.connect_timeout = Duration::from_secs(2);
    let Err(err) = connector.connect(&config) else {
        panic!("connect to a closed port must fail");
    };
    assert_eq!(err.kind(), "connection");
}

#[test]
fn facade_reports_refused_connection() {
    let facade = AmqpFacade::new(LapinConnector::new().unwrap());
    let mut config = sample_config();
    config.host = "127.0.0.1".to_string();
    config.port = closed_port();
    config.connect_timeout = Duration::from_secs(2);
    let err = facade.call("{}", "get_event", &config).unwrap_err();
    assert_eq!(err.kind(), "connection");
    assert!(err.is_retryable());
}
