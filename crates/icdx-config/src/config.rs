// crates/icdx-config/src/config.rs
// ============================================================================
// Module: ICDX Configuration
// Description: Configuration loading and validation for the ICDX bridge.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: icdx-amqp, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The `[amqp]` table is required; `[audit]` defaults to disabled. Missing or
//! out-of-range values fail closed before any broker connection is attempted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use icdx_amqp::AuditSink;
use icdx_amqp::ConnectionConfig;
use icdx_amqp::DEFAULT_AMQP_PORT;
use icdx_amqp::FileAuditSink;
use icdx_amqp::NoopAuditSink;
use icdx_amqp::StderrAuditSink;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "icdx.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "ICDX_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default virtual host.
pub(crate) const DEFAULT_VHOST: &str = "/";
/// Default routing key for requests.
pub(crate) const DEFAULT_ROUTING_KEY: &str = "icdx";
/// Default reply timeout in milliseconds.
pub(crate) const DEFAULT_TIMEOUT_MS: u64 = 10_000;
/// Default connect timeout in milliseconds.
pub(crate) const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
/// Host reported by loopback runs.
const LOOPBACK_HOST: &str = "localhost";
/// Login user reported by loopback runs.
const LOOPBACK_USERNAME: &str = "loopback";
/// Minimum accepted timeout in milliseconds.
pub(crate) const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum allowed reply timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 600_000;
/// Maximum allowed connect timeout in milliseconds.
pub(crate) const MAX_CONNECT_TIMEOUT_MS: u64 = 60_000;

// ============================================================================
// SECTION: Top-Level Config
// ============================================================================

/// ICDX bridge configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IcdxConfig {
    /// Broker connection settings.
    pub amqp: AmqpConfig,
    /// Audit output settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl IcdxConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::parse(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.amqp.validate()?;
        self.audit.validate()
    }
}

// ============================================================================
// SECTION: AMQP Config
// ============================================================================

/// Broker connection settings.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AmqpConfig {
    /// Broker host name or address.
    pub host: String,
    /// Broker port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login user.
    pub username: String,
    /// Login password.
    #[serde(default)]
    pub password: String,
    /// Virtual host.
    #[serde(default = "default_vhost")]
    pub vhost: String,
    /// Exchange requests are published on; empty selects the default exchange.
    #[serde(default)]
    pub exchange: String,
    /// Routing key, optionally containing `{operation}`.
    #[serde(default = "default_routing_key")]
    pub routing_key: String,
    /// Reply timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl AmqpConfig {
    /// Validates broker settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ConfigError::Invalid("amqp.host must be non-empty".to_string()));
        }
        if host.len() != self.host.len() {
            return Err(ConfigError::Invalid(
                "amqp.host must not have surrounding whitespace".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("amqp.port must be in 1..=65535".to_string()));
        }
        if self.username.trim().is_empty() {
            return Err(ConfigError::Invalid("amqp.username must be non-empty".to_string()));
        }
        if self.vhost.trim().is_empty() {
            return Err(ConfigError::Invalid("amqp.vhost must be non-empty".to_string()));
        }
        if self.routing_key.trim().is_empty() {
            return Err(ConfigError::Invalid("amqp.routing_key must be non-empty".to_string()));
        }
        validate_timeout("amqp.timeout_ms", self.timeout_ms, MAX_TIMEOUT_MS)?;
        validate_timeout("amqp.connect_timeout_ms", self.connect_timeout_ms, MAX_CONNECT_TIMEOUT_MS)
    }

    /// Returns default settings for in-process loopback runs.
    #[must_use]
    pub fn loopback() -> Self {
        Self {
            host: LOOPBACK_HOST.to_string(),
            port: default_port(),
            username: LOOPBACK_USERNAME.to_string(),
            password: String::new(),
            vhost: default_vhost(),
            exchange: String::new(),
            routing_key: default_routing_key(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }

    /// Converts the settings into the facade's connection config.
    #[must_use]
    pub fn to_connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            vhost: self.vhost.clone(),
            exchange: self.exchange.clone(),
            routing_key: self.routing_key.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
        }
    }
}

impl fmt::Debug for AmqpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmqpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("vhost", &self.vhost)
            .field("exchange", &self.exchange)
            .field("routing_key", &self.routing_key)
            .field("timeout_ms", &self.timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .finish()
    }
}

// ============================================================================
// SECTION: Audit Config
// ============================================================================

/// Audit output settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Enables audit output.
    #[serde(default)]
    pub enabled: bool,
    /// Optional JSONL file; stderr is used when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates audit settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the audit path is malformed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("audit.path", path)?;
        }
        Ok(())
    }

    /// Builds the audit sink selected by these settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the audit file cannot be opened.
    pub fn sink(&self) -> Result<Arc<dyn AuditSink>, ConfigError> {
        if !self.enabled {
            return Ok(Arc::new(NoopAuditSink));
        }
        match &self.path {
            Some(path) => {
                let sink = FileAuditSink::new(Path::new(path.trim()))
                    .map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(sink))
            }
            None => Ok(Arc::new(StderrAuditSink)),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default broker port.
const fn default_port() -> u16 {
    DEFAULT_AMQP_PORT
}

/// Default virtual host.
fn default_vhost() -> String {
    DEFAULT_VHOST.to_string()
}

/// Default routing key.
fn default_routing_key() -> String {
    DEFAULT_ROUTING_KEY.to_string()
}

/// Default reply timeout.
const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Default connect timeout.
const fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates a timeout against the shared lower bound and a field maximum.
pub(crate) fn validate_timeout(field: &str, value: u64, max: u64) -> Result<(), ConfigError> {
    if !(MIN_TIMEOUT_MS ..= max).contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between {MIN_TIMEOUT_MS} and {max}"
        )));
    }
    Ok(())
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.to_string_lossy().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path string against length limits.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}
