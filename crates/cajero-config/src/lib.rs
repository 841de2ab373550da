//! Shared configuration for the cajero CLI and TUI.
//!
//! TOML profiles, bearer-token storage (env + keyring), and translation
//! to `cajero_core::ServiceConfig`. Both binaries depend on this crate;
//! the CLI adds flag-aware wrappers on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use cajero_core::{DEFAULT_URL, Provider, ServiceConfig, TlsVerification};

/// Keyring service name.
const KEYRING_SERVICE: &str = "cajero";

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "CAJERO_CONFIG";

/// Bearer token supplied through the environment; beats the keyring.
pub const TOKEN_ENV: &str = "CAJERO_TOKEN";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named service profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds an issued withdrawal code is shown as valid.
    #[serde(default = "default_code_validity")]
    pub code_validity_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            code_validity_secs: default_code_validity(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_code_validity() -> u64 {
    cajero_core::DEFAULT_VALIDITY.as_secs()
}

/// A named account-service profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Service base URL (e.g., "http://localhost:5000").
    #[serde(default = "default_url")]
    pub url: String,

    /// Provider used when a command doesn't name one.
    pub provider: Option<Provider>,

    /// Account number used when a command doesn't name one.
    pub account: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override code validity.
    pub code_validity_secs: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            url: default_url(),
            provider: None,
            account: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            code_validity_secs: None,
        }
    }
}

fn default_url() -> String {
    DEFAULT_URL.into()
}

impl Config {
    /// Name of the profile to use: explicit choice, then `default_profile`,
    /// then `"default"`.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    /// Look up a profile. A missing `default` profile resolves to built-in
    /// defaults so a fresh install works without `config init`.
    pub fn profile(&self, name: &str) -> Result<Profile, ConfigError> {
        match self.profiles.get(name) {
            Some(profile) => Ok(profile.clone()),
            None if name == "default" => Ok(Profile::default()),
            None => Err(ConfigError::UnknownProfile { name: name.into() }),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `CAJERO_CONFIG`, then platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "cajero", "cajero").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("cajero");
    p
}

/// Directory for log files and other state (TUI logs land here).
pub fn data_dir() -> PathBuf {
    ProjectDirs::from("com", "cajero", "cajero").map_or_else(
        || dirs_fallback().join("data"),
        |dirs| dirs.data_local_dir().to_path_buf(),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path`, then `CAJERO_*` variables
/// (nested keys separated by `__`, e.g. `CAJERO_DEFAULTS__TIMEOUT`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(
            Env::prefixed("CAJERO_")
                .ignore(&["CONFIG", "TOKEN", "LOG"])
                .split("__"),
        );

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, falling back to defaults on any error.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_else(|e| {
        warn!(error = %e, "config unreadable, using defaults");
        Config::default()
    })
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}

// ── Token storage ───────────────────────────────────────────────────

fn token_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/token"),
    )?)
}

/// Bearer token for a profile: `CAJERO_TOKEN`, then the system keyring.
pub fn load_token(profile_name: &str) -> Option<SecretString> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.is_empty() {
            return Some(SecretString::from(token));
        }
    }

    match token_entry(profile_name).and_then(|e| Ok(e.get_password()?)) {
        Ok(token) => Some(SecretString::from(token)),
        Err(ConfigError::Keyring(keyring::Error::NoEntry)) => None,
        Err(e) => {
            debug!(error = %e, "keyring lookup failed");
            None
        }
    }
}

pub fn store_token(profile_name: &str, token: &SecretString) -> Result<(), ConfigError> {
    token_entry(profile_name)?.set_password(token.expose_secret())?;
    debug!(profile = profile_name, "token stored in keyring");
    Ok(())
}

/// Remove a stored token. Missing entries are not an error.
pub fn clear_token(profile_name: &str) -> Result<(), ConfigError> {
    match token_entry(profile_name)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ── Translation to core config ──────────────────────────────────────

/// Build a `ServiceConfig` from a profile, filling gaps from `defaults`.
pub fn profile_to_service_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ServiceConfig, ConfigError> {
    let url: url::Url = profile.url.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {}", profile.url),
    })?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let validity = profile
        .code_validity_secs
        .unwrap_or(defaults.code_validity_secs);
    if validity == 0 {
        return Err(ConfigError::Validation {
            field: "code_validity_secs".into(),
            reason: "must be at least 1".into(),
        });
    }

    let mut config = ServiceConfig::new(url);
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.code_validity = Duration::from_secs(validity);
    Ok(config)
}
