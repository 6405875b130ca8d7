//! Session controller configuration.
//!
//! Configuration is loaded from environment variables. The server address is
//! the only required value; everything else has a sensible default.

use std::collections::HashMap;
use std::env;
use thiserror::Error;

use common::config::ObservabilityConfig;
use common::types::DeviceId;

/// Default capacity of the actor command mailbox.
pub const DEFAULT_COMMAND_BUFFER: usize = 64;

/// Default capacity of the per-attempt stream event channel.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Default client instance id prefix.
pub const DEFAULT_CLIENT_ID_PREFIX: &str = "sc";

/// Session controller configuration.
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server address the transport authenticates against. Fixed per
    /// deployment; never supplied by the connect call.
    pub server: String,

    /// Unique identifier for this client instance, used in logs and metric
    /// labels.
    pub client_id: String,

    /// Capture device used for local video until one is selected.
    pub default_capture_device: DeviceId,

    /// Actor command mailbox capacity.
    pub command_buffer: usize,

    /// Per-attempt stream event channel capacity.
    pub event_buffer: usize,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// An environment variable is set to an unusable value.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `SC_SERVER` is missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `SC_SERVER` is missing or any value
    /// fails to parse.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let server = vars
            .get("SC_SERVER")
            .ok_or_else(|| ConfigError::MissingEnvVar("SC_SERVER".to_string()))?
            .clone();
        if server.is_empty() {
            return Err(ConfigError::InvalidValue(
                "SC_SERVER must not be empty".to_string(),
            ));
        }

        let client_id = vars.get("SC_CLIENT_ID").cloned().unwrap_or_else(|| {
            let uuid = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid.get(..8).unwrap_or("00000000");
            format!("{DEFAULT_CLIENT_ID_PREFIX}-{short_suffix}")
        });

        let default_capture_device = vars
            .get("SC_DEFAULT_CAPTURE_DEVICE")
            .map(DeviceId::new)
            .unwrap_or_default();

        let command_buffer = parse_buffer(vars, "SC_COMMAND_BUFFER", DEFAULT_COMMAND_BUFFER)?;
        let event_buffer = parse_buffer(vars, "SC_EVENT_BUFFER", DEFAULT_EVENT_BUFFER)?;

        let log_level = vars
            .get("SC_LOG_LEVEL")
            .cloned()
            .unwrap_or_else(|| "info".to_string());
        let json_logs = vars
            .get("SC_LOG_JSON")
            .is_some_and(|v| v == "true" || v == "1");

        Ok(Config {
            server,
            client_id,
            default_capture_device,
            command_buffer,
            event_buffer,
            observability: ObservabilityConfig {
                log_level,
                json_logs,
            },
        })
    }
}

/// Parse a channel capacity variable. Capacities must be at least 1 because
/// a zero-capacity bounded channel cannot be constructed.
fn parse_buffer(
    vars: &HashMap<String, String>,
    name: &str,
    default: usize,
) -> Result<usize, ConfigError> {
    let Some(raw) = vars.get(name) else {
        return Ok(default);
    };
    let value: usize = raw
        .parse()
        .map_err(|e| ConfigError::InvalidValue(format!("{name}: {e}")))?;
    if value == 0 {
        return Err(ConfigError::InvalidValue(format!(
            "{name} must be at least 1"
        )));
    }
    Ok(value)
}
