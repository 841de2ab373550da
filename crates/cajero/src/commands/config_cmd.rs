//! Config subcommand handlers.

use dialoguer::{Input, Select};
use strum::IntoEnumIterator;

use cajero_core::{DEFAULT_URL, Provider, validate};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util::{prompt_err, require_terminal};

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display. Tokens never live in the file, so nothing
/// needs masking beyond the account number.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "code_validity_secs = {}", cfg.defaults.code_validity_secs);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "url = \"{}\"", p.url);
        if let Some(provider) = p.provider {
            let _ = writeln!(out, "provider = \"{provider}\"");
        }
        if let Some(ref account) = p.account {
            let _ = writeln!(
                out,
                "account = \"{}\"",
                cajero_core::money::censor_number(account)
            );
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(validity) = p.code_validity_secs {
            let _ = writeln!(out, "code_validity_secs = {validity}");
        }
    }

    out.trim_end().to_owned()
}

fn parse_value<T: std::str::FromStr>(field: &str, value: &str, reason: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: reason.into(),
    })
}

/// Apply `config set <key> <value>` to a profile.
pub(crate) fn set_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "url" => {
            url_check(&value)?;
            profile.url = value;
        }
        "provider" => {
            profile.provider = Some(parse_value(
                "provider",
                &value,
                "must be 'bancolombia', 'nequi' or 'tarjeta'",
            )?);
        }
        "account" => {
            validate::non_empty("account", &value)?;
            profile.account = Some(value.trim().to_owned());
        }
        "insecure" => {
            profile.insecure = Some(parse_value("insecure", &value, "must be 'true' or 'false'")?);
        }
        "timeout" => {
            profile.timeout = Some(parse_value("timeout", &value, "must be a number (seconds)")?);
        }
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "code_validity_secs" | "code-validity-secs" => {
            let secs: u64 = parse_value(
                "code_validity_secs",
                &value,
                "must be a number (seconds)",
            )?;
            if secs == 0 {
                return Err(CliError::Validation {
                    field: "code_validity_secs".into(),
                    reason: "must be at least 1 second".into(),
                });
            }
            profile.code_validity_secs = Some(secs);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: url, provider, account, \
                     insecure, timeout, ca_cert, code_validity_secs"
                ),
            });
        }
    }
    Ok(())
}

fn url_check(value: &str) -> Result<(), CliError> {
    let parsed = value.parse::<url::Url>().map_err(|e| CliError::Validation {
        field: "url".into(),
        reason: e.to_string(),
    })?;
    if matches!(parsed.scheme(), "http" | "https") {
        Ok(())
    } else {
        Err(CliError::Validation {
            field: "url".into(),
            reason: "must be an http:// or https:// URL".into(),
        })
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            require_terminal("config init", "`cajero config set`")?;
            let config_path = config::config_path();
            eprintln!("cajero · configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let url: String = Input::new()
                .with_prompt("Service URL")
                .default(DEFAULT_URL.into())
                .validate_with(|v: &String| url_check(v).map_err(|e| e.to_string()))
                .interact_text()
                .map_err(prompt_err)?;

            let providers: Vec<Provider> = Provider::iter().collect();
            let labels: Vec<&str> = providers.iter().map(|p| p.brand().name).collect();
            let choice = Select::new()
                .with_prompt("Provider")
                .items(&labels)
                .default(0)
                .interact()
                .map_err(prompt_err)?;
            let provider = providers.get(choice).copied().unwrap_or_default();

            let account: String = Input::new()
                .with_prompt(format!("{} (blank to skip)", provider.brand().login_label))
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(
                profile_name.clone(),
                Profile {
                    url,
                    provider: Some(provider),
                    account: Some(account.trim().to_owned()).filter(|a| !a.is_empty()),
                    ..Profile::default()
                },
            );
            cfg.default_profile = Some(profile_name.clone());

            let path = config::save_config(&cfg)?;
            eprintln!("\n{}", output::success(&format!("✓ Configuration written to {}", path.display())));
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Next: cajero login");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                config::config_path().display().to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_key(profile, &key, value)?;

            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!(
                    "{}",
                    output::success(&format!("✓ Set {key} on profile '{profile_name}'"))
                );
            }
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: cajero config init");
            } else {
                let lines: Vec<String> = cfg
                    .profiles
                    .keys()
                    .map(|name| {
                        if name == default {
                            format!("{name} *")
                        } else {
                            name.clone()
                        }
                    })
                    .collect();
                output::print_output(&lines.join("\n"), global.quiet);
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();

            if !cfg.profiles.contains_key(&name) {
                let available: Vec<_> = cfg.profiles.keys().cloned().collect();
                return Err(CliError::ProfileNotFound {
                    name,
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available.join(", ")
                    },
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!(
                    "{}",
                    output::success(&format!("✓ Default profile set to '{name}'"))
                );
            }
            Ok(())
        }
    }
}
