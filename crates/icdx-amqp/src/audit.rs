// crates/icdx-amqp/src/audit.rs
// ============================================================================
// Module: ICDX AMQP Audit Logging
// Description: Structured audit events for facade calls.
// Purpose: Emit one JSON-lines record per call without logging payloads.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every facade call emits one [`AmqpCallEvent`] through an [`AuditSink`].
//! Events carry sizes, timings, and outcome labels only; request and reply
//! bodies are never recorded. Deployments route events by choosing a sink.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Audit record for one facade call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmqpCallEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Remote operation name.
    pub operation: String,
    /// Correlation identifier issued for the call.
    pub correlation_id: String,
    /// Call outcome label (`ok` or `error`).
    pub outcome: &'static str,
    /// Status code when the round trip completed.
    pub status_code: Option<u16>,
    /// Error kind label when the call failed.
    pub error_kind: Option<&'static str>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Reply body size in bytes (zero when no reply matched).
    pub response_bytes: usize,
    /// Wall time spent in the call.
    pub elapsed_ms: u128,
    /// Failure reported while releasing broker resources, if any.
    pub release_error: Option<String>,
}

/// Inputs required to construct a call audit event.
pub struct AmqpCallEventParams {
    /// Remote operation name.
    pub operation: String,
    /// Correlation identifier issued for the call.
    pub correlation_id: String,
    /// Status code when the round trip completed.
    pub status_code: Option<u16>,
    /// Error kind label when the call failed.
    pub error_kind: Option<&'static str>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Reply body size in bytes.
    pub response_bytes: usize,
    /// Wall time spent in the call.
    pub elapsed_ms: u128,
    /// Failure reported while releasing broker resources, if any.
    pub release_error: Option<String>,
}

impl AmqpCallEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: AmqpCallEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        let outcome = if params.error_kind.is_some() { "error" } else { "ok" };
        Self {
            event: "amqp_call",
            timestamp_ms,
            operation: params.operation,
            correlation_id: params.correlation_id,
            outcome,
            status_code: params.status_code,
            error_kind: params.error_kind,
            request_bytes: params.request_bytes,
            response_bytes: params.response_bytes,
            elapsed_ms: params.elapsed_ms,
            release_error: params.release_error,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for facade call events.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &AmqpCallEvent);
}

/// Audit sink that discards events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &AmqpCallEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &AmqpCallEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &AmqpCallEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Audit sink that keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<AmqpCallEvent>>,
}

impl MemoryAuditSink {
    /// Creates an empty in-memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<AmqpCallEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &AmqpCallEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
