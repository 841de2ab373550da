//! CLI configuration: thin wrapper around `cajero_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--url, --provider, --insecure, --timeout).

use cajero_core::{Provider, ServiceConfig, TlsVerification};

use crate::cli::{GlobalOpts, ProviderArg};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use cajero_config::{
    Config, Profile, clear_token, config_path, load_config_or_default, load_token,
    save_config, store_token,
};

/// Everything a command needs to know about where and as whom it runs.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub profile_name: String,
    pub provider: Provider,
    /// Default account number from the profile.
    pub account: Option<String>,
    pub service: ServiceConfig,
}

impl From<ProviderArg> for Provider {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Bancolombia => Provider::Bancolombia,
            ProviderArg::Nequi => Provider::Nequi,
            ProviderArg::Tarjeta => Provider::Tarjeta,
        }
    }
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Translate the active profile + global flags into a `Resolved`.
///
/// Flag overrides take priority over profile values.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    let mut profile = cfg.profile(&profile_name)?;

    // 1. URL (flag > env > profile)
    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }

    // 2. Timeout
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    let mut service = cajero_config::profile_to_service_config(&profile, &cfg.defaults)?;

    // 3. TLS: --insecure always wins
    if global.insecure {
        service.tls = TlsVerification::DangerAcceptInvalid;
    }

    // 4. Provider (flag > profile > Bancolombia)
    let provider = global
        .provider
        .map(Provider::from)
        .or(profile.provider)
        .unwrap_or_default();

    Ok(Resolved {
        profile_name,
        provider,
        account: profile.account,
        service,
    })
}
