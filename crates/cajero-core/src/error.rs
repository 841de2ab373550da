// ── Core error types ──
//
// Consumers never see HTTP status codes or JSON parse failures directly.
// The `From<cajero_api::Error>` impl translates transport-layer errors
// into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the account service at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Account service timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Account not found: {number}")]
    AccountNotFound { number: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Rejected by the account service: {message}")]
    Rejected { message: String, status: Option<u16> },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<cajero_api::Error> for CoreError {
    fn from(err: cajero_api::Error) -> Self {
        match err {
            cajero_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            cajero_api::Error::MissingToken => CoreError::NotLoggedIn,
            cajero_api::Error::Rejected { status, message } => {
                if status >= 500 {
                    CoreError::Api {
                        message,
                        status: Some(status),
                    }
                } else {
                    CoreError::Rejected {
                        message,
                        status: Some(status),
                    }
                }
            }
            cajero_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            cajero_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            cajero_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            cajero_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            cajero_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
