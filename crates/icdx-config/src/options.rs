// crates/icdx-config/src/options.rs
// ============================================================================
// Module: ICDX Option Maps
// Description: Flat string option parsing for host-integration settings.
// Purpose: Resolve `icdx_*` key/value options into a validated AMQP config.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Integration hosts often hand over settings as a flat map where every value
//! is a string. [`AmqpOptions`] captures the raw `icdx_*` keys and resolves
//! them into an [`AmqpConfig`], parsing numbers and applying the same defaults
//! and bounds as `icdx.toml`. Timeouts in option maps are whole seconds.
//!
//! A map where every option is `"10"` resolves successfully.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::config::AmqpConfig;
use crate::config::ConfigError;
use crate::config::DEFAULT_CONNECT_TIMEOUT_MS;
use crate::config::DEFAULT_ROUTING_KEY;
use crate::config::DEFAULT_TIMEOUT_MS;
use crate::config::DEFAULT_VHOST;

// ============================================================================
// SECTION: Keys
// ============================================================================

/// Broker host.
pub const HOST_KEY: &str = "icdx_amqp_host";
/// Broker port.
pub const PORT_KEY: &str = "icdx_amqp_port";
/// Virtual host.
pub const VHOST_KEY: &str = "icdx_amqp_vhost";
/// Login user.
pub const USERNAME_KEY: &str = "icdx_amqp_username";
/// Login password.
pub const PASSWORD_KEY: &str = "icdx_amqp_password";
/// Exchange name.
pub const EXCHANGE_KEY: &str = "icdx_amqp_exchange";
/// Routing key.
pub const ROUTING_KEY_KEY: &str = "icdx_amqp_routing_key";
/// Reply timeout in seconds.
pub const TIMEOUT_KEY: &str = "icdx_search_timeout";
/// Connect timeout in seconds.
pub const CONNECT_TIMEOUT_KEY: &str = "icdx_connect_timeout";

/// Milliseconds per option-map second.
const MILLIS_PER_SECOND: u64 = 1_000;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Raw `icdx_*` options before parsing.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AmqpOptions {
    /// Value of `icdx_amqp_host`.
    pub host: Option<String>,
    /// Value of `icdx_amqp_port`.
    pub port: Option<String>,
    /// Value of `icdx_amqp_vhost`.
    pub vhost: Option<String>,
    /// Value of `icdx_amqp_username`.
    pub username: Option<String>,
    /// Value of `icdx_amqp_password`.
    pub password: Option<String>,
    /// Value of `icdx_amqp_exchange`.
    pub exchange: Option<String>,
    /// Value of `icdx_amqp_routing_key`.
    pub routing_key: Option<String>,
    /// Value of `icdx_search_timeout`.
    pub timeout_secs: Option<String>,
    /// Value of `icdx_connect_timeout`.
    pub connect_timeout_secs: Option<String>,
}

impl AmqpOptions {
    /// Collects options from a string map; unrelated keys are ignored.
    #[must_use]
    pub fn from_options(options: &BTreeMap<String, String>) -> Self {
        Self::from_lookup(|key| options.get(key).cloned())
    }

    /// Collects options by asking `lookup` for each known key.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            host: lookup(HOST_KEY),
            port: lookup(PORT_KEY),
            vhost: lookup(VHOST_KEY),
            username: lookup(USERNAME_KEY),
            password: lookup(PASSWORD_KEY),
            exchange: lookup(EXCHANGE_KEY),
            routing_key: lookup(ROUTING_KEY_KEY),
            timeout_secs: lookup(TIMEOUT_KEY),
            connect_timeout_secs: lookup(CONNECT_TIMEOUT_KEY),
        }
    }

    /// Parses, defaults, and validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a required key is missing, a
    /// numeric value does not parse, or the result fails validation.
    pub fn resolve(&self) -> Result<AmqpConfig, ConfigError> {
        let config = AmqpConfig {
            host: required(HOST_KEY, self.host.as_deref())?.to_string(),
            port: parse_number(PORT_KEY, required(PORT_KEY, self.port.as_deref())?)?,
            username: required(USERNAME_KEY, self.username.as_deref())?.to_string(),
            password: required(PASSWORD_KEY, self.password.as_deref())?.to_string(),
            vhost: optional(self.vhost.as_deref()).unwrap_or(DEFAULT_VHOST).to_string(),
            exchange: optional(self.exchange.as_deref()).unwrap_or_default().to_string(),
            routing_key: optional(self.routing_key.as_deref())
                .unwrap_or(DEFAULT_ROUTING_KEY)
                .to_string(),
            timeout_ms: seconds_to_millis(TIMEOUT_KEY, self.timeout_secs.as_deref())?
                .unwrap_or(DEFAULT_TIMEOUT_MS),
            connect_timeout_ms: seconds_to_millis(
                CONNECT_TIMEOUT_KEY,
                self.connect_timeout_secs.as_deref(),
            )?
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
        };
        config.validate()?;
        Ok(config)
    }
}

impl std::fmt::Debug for AmqpOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmqpOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("vhost", &self.vhost)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("exchange", &self.exchange)
            .field("routing_key", &self.routing_key)
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the trimmed value, treating blank strings as absent.
fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Returns the trimmed value or an error naming the missing key.
fn required<'a>(key: &str, value: Option<&'a str>) -> Result<&'a str, ConfigError> {
    optional(value).ok_or_else(|| ConfigError::Invalid(format!("{key} is required")))
}

/// Parses a numeric option.
fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse::<T>()
        .map_err(|_| ConfigError::Invalid(format!("{key} must be a number, got '{value}'")))
}

/// Parses an optional seconds value into milliseconds.
fn seconds_to_millis(key: &str, value: Option<&str>) -> Result<Option<u64>, ConfigError> {
    let Some(value) = optional(value) else {
        return Ok(None);
    };
    let seconds: u64 = parse_number(key, value)?;
    seconds
        .checked_mul(MILLIS_PER_SECOND)
        .map(Some)
        .ok_or_else(|| ConfigError::Invalid(format!("{key} is out of range")))
}
