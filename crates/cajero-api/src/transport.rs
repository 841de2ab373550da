// Shared transport configuration for building reqwest::Client instances.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (local demo servers with self-signed certs).
    DangerAcceptInvalid,
}

/// Transport settings for the account service client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("cajero/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
