//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use bms_config::ConfigError;
use bms_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the building database")]
    #[diagnostic(
        code(bms::connection_failed),
        help(
            "Check the database URL and your network connection.\n\
             Reason: {reason}\n\
             Try: bms --memory get / to check the CLI without a database"
        )
    )]
    ConnectionFailed { reason: String },

    #[error("The database rejected the write to '{path}'")]
    #[diagnostic(
        code(bms::write_failed),
        help("Reason: {reason}\nThe local value was kept; nothing was retried.")
    )]
    WriteFailed { path: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(bms::auth_failed),
        help("Check the email and password, or run: bms signup --email <EMAIL>")
    )]
    AuthFailed { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Nothing stored at '{path}'")]
    #[diagnostic(code(bms::not_found))]
    NotFound { path: String },

    #[error("Unexpected value at '{path}': {message}")]
    #[diagnostic(code(bms::decode))]
    Decode { path: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(bms::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(bms::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: bms config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No database configured")]
    #[diagnostic(
        code(bms::no_config),
        help(
            "Create a profile with: bms config init\n\
             Or pass --database <URL>, or --memory for a local store.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(bms::config))]
    Config { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(bms::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(bms::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(bms::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::Json(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { path } => CliError::NotFound { path },

            CoreError::Transport { message } => CliError::ConnectionFailed { reason: message },

            CoreError::AuthFailure { message } => CliError::AuthFailed { message },

            CoreError::Decode { path, message } => CliError::Decode {
                path: path.to_string(),
                message,
            },

            CoreError::UnknownDevice { cabin, device } => CliError::Validation {
                field: "device".into(),
                reason: format!(
                    "'{device}' is not fitted in {cabin}; expected one of \
                     AirCondition, SmartLight, AirPurifier, LEDLight, HVAC, IAQSensor"
                ),
            },

            CoreError::InvalidTime { input } => CliError::Validation {
                field: "time".into(),
                reason: format!("'{input}' is not a time like 9:00 AM or 18:00"),
            },

            CoreError::Config { message } => CliError::Config { message },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name, available } => CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            },
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
