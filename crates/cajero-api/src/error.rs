use thiserror::Error;

/// Top-level error type for the `cajero-api` crate.
///
/// `cajero-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login refused, or a bearer token was rejected.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A bearer-only endpoint was called without a token.
    #[error("Not logged in -- no bearer token available")]
    MissingToken,

    // ── Service ─────────────────────────────────────────────────────
    /// The service answered with a non-success status and a message.
    #[error("Service rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if logging in again might resolve this error.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::MissingToken)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Rejected { status: 404, .. } => true,
            _ => false,
        }
    }

    /// The message the service attached to a rejection, if any.
    pub fn service_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } | Self::Authentication { message } => Some(message),
            _ => None,
        }
    }
}
