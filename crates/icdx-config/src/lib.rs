// crates/icdx-config/src/lib.rs
// ============================================================================
// Module: ICDX Config Library
// Description: Canonical config model and validation for the ICDX bridge.
// Purpose: Single source of truth for icdx.toml and option-map semantics.
// Dependencies: icdx-amqp, serde, toml
// ============================================================================

//! ## Overview
//! `icdx-config` loads broker and audit settings either from an `icdx.toml`
//! file or from a flat string option map, validates them fail-closed, and
//! converts them into the [`icdx_amqp::ConnectionConfig`] and
//! [`icdx_amqp::AuditSink`] the facade consumes.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;
pub mod options;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
pub use options::AmqpOptions;
