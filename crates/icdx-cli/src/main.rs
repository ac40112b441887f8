// crates/icdx-cli/src/main.rs
// ============================================================================
// Module: ICDX CLI Entry Point
// Description: Command dispatcher for ICDX configuration and event lookups.
// Purpose: Validate deployments and run workflow functions from a shell.
// Dependencies: clap, icdx-amqp, icdx-config, icdx-functions, serde_json, thiserror.
// ============================================================================

//! ## Overview
//! The `icdx` binary checks `icdx.toml` files and runs the `icdx_get_event`
//! workflow function, either against the configured broker or against an
//! in-memory loopback that answers every request itself.
//!
//! The facade blocks while waiting for replies, so the entry point is a plain
//! synchronous `main`.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use icdx_amqp::AmqpFacade;
use icdx_amqp::AuditSink;
use icdx_amqp::BrokerConnector;
use icdx_amqp::CallbackConnector;
use icdx_amqp::ConnectionConfig;
use icdx_amqp::LapinConnector;
use icdx_amqp::NoopAuditSink;
use icdx_config::AmqpConfig;
use icdx_config::IcdxConfig;
use icdx_config::config_toml_example;
use icdx_functions::FunctionResult;
use icdx_functions::GetEventFunction;
use icdx_functions::UUID_INPUT;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "icdx", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Fetch one ICDX event by UUID.
    GetEvent(GetEventCommand),
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate an ICDX configuration file.
    Check(ConfigCheckCommand),
    /// Print a canonical example configuration.
    Example,
}

/// Arguments for `config check`.
#[derive(Args, Debug)]
struct ConfigCheckCommand {
    /// Config file path (defaults to `ICDX_CONFIG` or `icdx.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `get-event`.
#[derive(Args, Debug)]
struct GetEventCommand {
    /// Event UUID, forwarded verbatim.
    #[arg(long, value_name = "UUID")]
    uuid: String,
    /// Config file path (defaults to `ICDX_CONFIG` or `icdx.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Answer in-process instead of contacting a broker.
    #[arg(long, value_enum, value_name = "OUTCOME")]
    loopback: Option<LoopbackArg>,
}

/// Loopback reply outcome.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LoopbackArg {
    /// Reply with `success: true`.
    Success,
    /// Reply with `success: false`.
    Failure,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Config {
            command,
        } => command_config(command),
        Commands::GetEvent(command) => command_get_event(&command),
    }
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Check(command) => command_config_check(&command),
        ConfigCommand::Example => {
            write_stdout(&config_toml_example())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Executes the config check command.
fn command_config_check(command: &ConfigCheckCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    write_stdout(&format!(
        "config ok: amqp://{}:{}{} routing_key={}\n",
        config.amqp.host, config.amqp.port, config.amqp.vhost, config.amqp.routing_key
    ))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Get Event Command
// ============================================================================

/// Executes the get-event command.
///
/// Exits successfully whenever the round trip completed, whatever the
/// `success` flag; facade failures exit with a failure code after printing
/// their result object.
fn command_get_event(command: &GetEventCommand) -> CliResult<ExitCode> {
    let result = get_event_result(command)?;
    let rendered = serde_json::to_string_pretty(&result)
        .map_err(|err| CliError::new(format!("failed to render result: {err}")))?;
    write_stdout(&format!("{rendered}\n"))?;
    if result.status_code.is_some() { Ok(ExitCode::SUCCESS) } else { Ok(ExitCode::FAILURE) }
}

/// Runs the workflow function for the command's UUID.
fn get_event_result(command: &GetEventCommand) -> CliResult<FunctionResult> {
    let (connector, connection, audit) = resolve_backend(command)?;
    let facade = AmqpFacade::builder()
        .shared_connector(connector)
        .shared_audit(audit)
        .build()
        .map_err(|err| CliError::new(err.to_string()))?;
    let function = GetEventFunction::new(Arc::new(facade), connection);
    let mut inputs = Map::new();
    inputs.insert(UUID_INPUT.to_string(), Value::String(command.uuid.clone()));
    function.run(&inputs).map_err(|err| CliError::new(err.to_string()))
}

/// Backend pieces for one facade.
type Backend = (Arc<dyn BrokerConnector>, ConnectionConfig, Arc<dyn AuditSink>);

/// Picks the connector, connection settings, and audit sink for a command.
fn resolve_backend(command: &GetEventCommand) -> CliResult<Backend> {
    match command.loopback {
        Some(outcome) => {
            let connector: Arc<dyn BrokerConnector> =
                Arc::new(CallbackConnector::echo(outcome == LoopbackArg::Success));
            match command.config.as_deref() {
                Some(path) => {
                    let config = load_config(Some(path))?;
                    Ok((connector, config.amqp.to_connection_config(), audit_sink(&config)?))
                }
                None => {
                    let audit: Arc<dyn AuditSink> = Arc::new(NoopAuditSink);
                    Ok((connector, AmqpConfig::loopback().to_connection_config(), audit))
                }
            }
        }
        None => {
            let config = load_config(command.config.as_deref())?;
            let connector: Arc<dyn BrokerConnector> = Arc::new(
                LapinConnector::new().map_err(|err| CliError::new(err.to_string()))?,
            );
            Ok((connector, config.amqp.to_connection_config(), audit_sink(&config)?))
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads and validates configuration.
fn load_config(path: Option<&Path>) -> CliResult<IcdxConfig> {
    IcdxConfig::load(path).map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Builds the configured audit sink.
fn audit_sink(config: &IcdxConfig) -> CliResult<Arc<dyn AuditSink>> {
    config.audit.sink().map_err(|err| CliError::new(format!("failed to open audit sink: {err}")))
}

/// Writes text to stdout.
fn write_stdout(text: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    stdout
        .write_all(text.as_bytes())
        .map_err(|err| CliError::new(format!("failed to write to stdout: {err}")))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
