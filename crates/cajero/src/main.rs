mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cajero_core::Bank;

use crate::cli::{Cli, Command};
use crate::commands::Context;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);
    output::init_color(&cli.global.color);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CAJERO_LOG").unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Local commands never touch the service
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "cajero", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let resolved = config::resolve(&cli.global)?;
            let bank = Bank::new(resolved.service.clone())?;
            if let Some(token) = config::load_token(&resolved.profile_name) {
                bank.set_token(token);
            }

            tracing::debug!(
                profile = %resolved.profile_name,
                provider = %resolved.provider,
                url = %resolved.service.url,
                "dispatching command"
            );
            let ctx = Context { bank, resolved };
            commands::dispatch(cmd, &ctx, &cli.global).await
        }
    }
}
