pub mod bounds;
pub mod catalog;
pub mod config;
pub mod doctor;
pub mod quote;

use agentquote_core::config::{AppConfig, LoadOptions};
use agentquote_core::cpq::catalog::Catalog;
use agentquote_core::errors::ApplicationError;
use agentquote_core::fixtures::demo_catalog;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_CATALOG: u8 = 3;
pub const EXIT_INVALID_ARGUMENT: u8 = 4;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            hint: None,
            correlation_id: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            hint: None,
            correlation_id: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Failure raised by the core crate, mapped through the interface error layer.
    pub fn application_failure(
        command: &str,
        error_class: &str,
        error: ApplicationError,
        exit_code: u8,
    ) -> Self {
        let interface = error.into_interface(Uuid::new_v4().to_string());
        warn!(
            event_name = "cli.command_failed",
            command,
            error_class,
            correlation_id = interface.correlation_id(),
            error = %interface,
            "command failed"
        );
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: interface.to_string(),
            hint: Some(interface.user_message().to_string()),
            correlation_id: Some(interface.correlation_id().to_string()),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Successful command with a caller-rendered body instead of the envelope.
    pub fn report(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }
}

/// Loaded configuration plus the catalog it points at.
pub struct CommandContext {
    pub config: AppConfig,
    pub catalog: Catalog,
}

pub fn load_context(command: &str) -> Result<CommandContext, CommandResult> {
    let config = load_config(command)?;
    let catalog = load_catalog(&config).map_err(|error| {
        CommandResult::application_failure(command, "catalog_load", error, EXIT_CATALOG)
    })?;

    Ok(CommandContext { config, catalog })
}

pub fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::application_failure(
            command,
            "config_validation",
            ApplicationError::from(error),
            EXIT_CONFIG,
        )
    })
}

pub fn load_catalog(config: &AppConfig) -> Result<Catalog, ApplicationError> {
    match &config.catalog.path {
        Some(path) => Ok(Catalog::from_json_path(path)?),
        None => Ok(demo_catalog()),
    }
}

pub(crate) fn to_pretty_json<T: Serialize>(command: &str, value: &T) -> CommandResult {
    match serde_json::to_string_pretty(value) {
        Ok(output) => CommandResult::report(output),
        Err(error) => CommandResult::failure(command, "serialization", error.to_string(), 1),
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
