//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use cajero_config::ConfigError;
use cajero_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the account service at {url}")]
    #[diagnostic(
        code(cajero::connection_failed),
        help(
            "Check that the service is running and reachable.\n\
             Set another URL with --url or: cajero config set url <URL>"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(cajero::auth_failed),
        help("Check the phone/card number and PIN, then run: cajero login")
    )]
    AuthFailed { message: String },

    #[error("Not logged in on profile '{profile}'")]
    #[diagnostic(
        code(cajero::not_logged_in),
        help("Run: cajero login --phone <PHONE>  (or --card <NUMBER> for debit cards)")
    )]
    NotLoggedIn { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(cajero::not_found),
        help("Double-check the number, or open one with: cajero account create")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    // ── Service ──────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(cajero::rejected))]
    Rejected { message: String },

    #[error("API error: {message}")]
    #[diagnostic(code(cajero::api_error))]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(cajero::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(cajero::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: cajero config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No account number given")]
    #[diagnostic(
        code(cajero::no_account),
        help("Pass --account <NUMBER> or run: cajero config set account <NUMBER>")
    )]
    NoAccount,

    #[error(transparent)]
    #[diagnostic(code(cajero::config))]
    Config(ConfigError),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(cajero::timeout),
        help("Increase timeout with --timeout or check the service.")
    )]
    Timeout { seconds: u64 },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NotLoggedIn { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoAccount => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::NotLoggedIn => CliError::NotLoggedIn {
                profile: "current".into(),
            },
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::AccountNotFound { number } => CliError::NotFound {
                resource_type: "account".into(),
                identifier: number,
            },
            CoreError::Rejected { message, .. } => CliError::Rejected { message },
            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Api { message, .. } => CliError::ApiError { message },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => {
                let cfg = cajero_config::load_config_or_default();
                let available: Vec<_> = cfg.profiles.keys().cloned().collect();
                CliError::ProfileNotFound {
                    name,
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available.join(", ")
                    },
                }
            }
            other => CliError::Config(other),
        }
    }
}
