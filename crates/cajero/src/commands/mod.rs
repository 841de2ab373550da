//! Command dispatch.

pub mod account;
pub mod atm;
pub mod auth;
pub mod code;
pub mod config_cmd;
pub mod util;
pub mod withdraw;

use cajero_core::Bank;

use crate::cli::{Command, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;

/// Per-invocation state shared by service-bound handlers.
pub struct Context {
    pub bank: Bank,
    pub resolved: Resolved,
}

impl Context {
    /// `--account` if given, otherwise the profile's account.
    pub fn account(&self, explicit: Option<String>) -> Result<String, CliError> {
        explicit
            .or_else(|| self.resolved.account.clone())
            .filter(|a| !a.trim().is_empty())
            .ok_or(CliError::NoAccount)
    }

    pub fn not_logged_in(&self) -> CliError {
        CliError::NotLoggedIn {
            profile: self.resolved.profile_name.clone(),
        }
    }
}

/// Route a service-bound command to its handler.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Account(args) => account::handle(ctx, args, global).await,
        Command::Login(args) => auth::login(ctx, args, global).await,
        Command::Logout => auth::logout(ctx, global),
        Command::Transactions => auth::transactions(ctx, global).await,
        Command::Code(args) => code::handle(ctx, args, global).await,
        Command::Withdraw(args) => withdraw::handle(ctx, args, global).await,
        Command::Atm(args) => atm::handle(ctx, args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "local command routed to the service dispatcher".into(),
        )),
    }
}
