// crates/icdx-amqp/tests/transports/callback_tests.rs
// ============================================================================
// Module: Callback Transport Tests
// Description: Tests for the in-memory callback transport.
// Purpose: Validate reply queuing and resource counters.
// Dependencies: icdx-amqp, serde_json
// ============================================================================

//! ## Overview
//! Exercises [`CallbackConnector`] directly through the transport traits.

use std::time::Duration;

use icdx_amqp::BrokerConnector;
use icdx_amqp::CallbackConnector;
use icdx_amqp::CallbackReply;
use icdx_amqp::OutboundMessage;
use serde_json::Value;
use serde_json::json;

use crate::common::sample_config;

fn outbound(correlation_id: &str, body: &[u8]) -> OutboundMessage {
    OutboundMessage {
        exchange: String::new(),
        routing_key: "icdx".to_string(),
        operation: "get_event".to_string(),
        correlation_id: correlation_id.to_string(),
        reply_to: "amq.gen-callback-1".to_string(),
        body: body.to_vec(),
    }
}

#[test]
fn echo_reply_is_correlated_to_the_request() {
    let connector = CallbackConnector::echo(true);
    let mut connection = connector.connect(&sample_config()).unwrap();
    let mut channel = connection.open_channel().unwrap();
    let queue = channel.declare_reply_queue().unwrap();
    assert_eq!(queue, "amq.gen-callback-1");

    channel.publish(&outbound("abc", br#"{"id": 0, "uuid": "u"}"#)).unwrap();
    let delivery = channel.next_delivery(Duration::from_millis(10)).unwrap().unwrap();
    assert!(delivery.answers("abc"));
    let body: Value = serde_json::from_slice(&delivery.body).unwrap();
    assert_eq!(body, json!({"id": 0, "uuid": "u", "success": true}));
    assert!(channel.next_delivery(Duration::from_millis(10)).unwrap().is_none());

    channel.release().unwrap();
    connection.release().unwrap();
    assert!(connector.stats().all_released());
}

#[test]
fn echo_nests_non_object_requests() {
    let connector = CallbackConnector::echo(false);
    let mut connection = connector.connect(&sample_config()).unwrap();
    let mut channel = connection.open_channel().unwrap();
    channel.publish(&outbound("abc", b"[1, 2]")).unwrap();
    let delivery = channel.next_delivery(Duration::ZERO).unwrap().unwrap();
    let body: Value = serde_json::from_slice(&delivery.body).unwrap();
    assert_eq!(body, json!({"request": [1, 2], "success": false}));
}

#[test]
fn echo_rejects_non_json_requests() {
    let connector = CallbackConnector::echo(true);
    let mut connection = connector.connect(&sample_config()).unwrap();
    let mut channel = connection.open_channel().unwrap();
    let err = channel.publish(&outbound("abc", b"nope")).unwrap_err();
    assert_eq!(err.kind(), "protocol");
    assert_eq!(connector.stats().published(), 0);

    channel.publish(&outbound("def", b"{}")).unwrap();
    assert_eq!(connector.stats().published(), 1);
}

#[test]
fn stats_track_open_and_close() {
    let connector = CallbackConnector::new(|_| Ok(CallbackReply::Silent));
    let stats = connector.stats();
    let mut connection = connector.connect(&sample_config()).unwrap();
    let mut first = connection.open_channel().unwrap();
    let second = connection.open_channel().unwrap();
    assert_eq!(stats.connections_opened(), 1);
    assert_eq!(stats.channels_opened(), 2);
    assert!(!stats.all_released());

    first.publish(&outbound("a", b"{}")).unwrap();
    assert_eq!(stats.published(), 1);
    first.release().unwrap();
    drop(second);
    assert_eq!(stats.channels_closed(), 1);
    connection.release().unwrap();
    assert_eq!(stats.connections_closed(), 1);
}

#[test]
fn unreachable_connector_refuses() {
    let connector = CallbackConnector::unreachable("down");
    let Err(err) = connector.connect(&sample_config()) else {
        panic!("unreachable connector must refuse");
    };
    assert_eq!(err.kind(), "connection");
    assert_eq!(connector.stats().connections_opened(), 0);
}
