//! `cajero-tui`: terminal front end for the cajero demo bank.
//!
//! Sign in with Bancolombia, Nequi or a debit card, watch the balance and
//! movements, issue withdrawal codes with a live countdown, and walk
//! through the ATM flow.
//!
//! Logs go to a file (default `<data dir>/cajero-tui.log`) so they never
//! corrupt the terminal.

mod action;
mod app;
mod component;
mod event;
mod screen;
mod screens;
mod session_bridge;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use cajero_core::{Bank, Provider};

use crate::app::App;

/// Terminal UI for the cajero demo bank.
#[derive(Parser, Debug)]
#[command(name = "cajero-tui", version, about)]
struct Cli {
    /// Config profile to use
    #[arg(short, long, env = "CAJERO_PROFILE")]
    profile: Option<String>,

    /// Account service URL (overrides the profile)
    #[arg(short = 'u', long, env = "CAJERO_URL")]
    url: Option<String>,

    /// Provider shown when a stored session is resumed
    #[arg(long, env = "CAJERO_PROVIDER")]
    provider: Option<Provider>,

    /// Log file path
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing. Nothing may be written to stdout/stderr while the
/// terminal is in raw mode. Hold the guard until exit so logs flush.
fn setup_tracing(cli: &Cli) -> Result<WorkerGuard> {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("CAJERO_LOG").unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "cajero_tui={log_level},cajero_core={log_level},cajero_api={log_level}"
        ))
    });

    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| cajero_config::data_dir().join("cajero-tui.log"));
    let log_dir = log_file
        .parent()
        .map_or_else(|| PathBuf::from("."), std::path::Path::to_path_buf);
    std::fs::create_dir_all(&log_dir)?;
    let log_name = log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("cajero-tui.log"));

    let (non_blocking, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&log_dir, log_name));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli)?;

    // Flags > profile > built-in defaults
    let cfg = cajero_config::load_config_or_default();
    let profile_name = cfg.active_profile_name(cli.profile.as_deref());
    let mut profile = cfg.profile(&profile_name)?;
    if let Some(ref url) = cli.url {
        profile.url.clone_from(url);
    }
    let provider = cli.provider.or(profile.provider).unwrap_or_default();
    let service = cajero_config::profile_to_service_config(&profile, &cfg.defaults)?;

    info!(profile = %profile_name, url = %service.url, %provider, "starting cajero-tui");

    let bank = Bank::new(service)?;
    if let Some(token) = cajero_config::load_token(&profile_name) {
        bank.set_token(token);
    }

    let mut app = App::new(bank, profile_name, provider);
    app.run().await
}
