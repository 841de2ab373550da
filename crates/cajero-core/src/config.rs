// ── Runtime service configuration ──
//
// Describes how to reach the account service and how long issued codes
// stay valid. Never touches disk; the CLI/TUI build one from the config
// crate and hand it in.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::session::DEFAULT_VALIDITY;

/// Where the service listens when nothing else is configured.
pub const DEFAULT_URL: &str = "http://localhost:5000";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed demo servers).
    DangerAcceptInvalid,
}

/// Connection and session settings for one account service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Service root, e.g. `http://localhost:5000`.
    pub url: Url,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// How long an issued withdrawal code is shown as valid.
    pub code_validity: Duration,
}

impl ServiceConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            code_validity: DEFAULT_VALIDITY,
        }
    }

    pub(crate) fn transport(&self) -> cajero_api::TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => cajero_api::TlsMode::System,
            TlsVerification::CustomCa(path) => cajero_api::TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => cajero_api::TlsMode::DangerAcceptInvalid,
        };
        cajero_api::TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}
