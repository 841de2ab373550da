//! Login, logout and the transaction feed.

use tabled::Tabled;
use tracing::warn;

use cajero_core::money::format_cop;
use cajero_core::{CoreError, Credentials, Provider, Transaction};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::{Context, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct TransactionRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&Transaction> for TransactionRow {
    fn from(t: &Transaction) -> Self {
        Self {
            date: t.date.as_deref().map(short_date).unwrap_or_default(),
            kind: t.kind.clone(),
            amount: format_cop(t.amount),
            status: t.status.clone().unwrap_or_default(),
        }
    }
}

/// RFC 3339 timestamps become local `YYYY-MM-DD HH:MM`; anything else is shown as-is.
pub(crate) fn short_date(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_owned(),
        |dt| {
            dt.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        },
    )
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn login(ctx: &Context, args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let provider = ctx.resolved.provider;

    let credentials = match (args.phone, args.card) {
        (_, Some(number)) => Credentials::Card {
            number,
            pin: util::read_pin(args.pin, "PIN: ")?,
        },
        (Some(phone), None) if provider.uses_phone() => Credentials::Phone {
            phone,
            pin: util::read_pin(args.pin, "PIN: ")?,
            kind: provider.kind(),
        },
        (Some(_), None) => {
            return Err(CliError::Validation {
                field: "phone".into(),
                reason: "debit cards log in with --card".into(),
            });
        }
        (None, None) if provider == Provider::Tarjeta => {
            let number = util::prompt_text("Card number", "--card")?;
            Credentials::Card {
                number,
                pin: util::read_pin(args.pin, "PIN: ")?,
            }
        }
        (None, None) => {
            let phone = util::prompt_text("Phone number", "--phone")?;
            Credentials::Phone {
                phone,
                pin: util::read_pin(args.pin, "PIN: ")?,
                kind: provider.kind(),
            }
        }
    };

    let token = ctx.bank.login(credentials).await?;

    if !args.no_store {
        if let Err(e) = config::store_token(&ctx.resolved.profile_name, &token) {
            warn!(error = %e, "could not store token in keyring");
            if !global.quiet {
                eprintln!(
                    "{}",
                    output::warning("! Logged in, but the token could not be saved to the keyring")
                );
            }
            return Ok(());
        }
    }

    if !global.quiet {
        eprintln!(
            "{}",
            output::success(&format!(
                "✓ Logged in to {} (profile '{}')",
                provider.brand().name,
                ctx.resolved.profile_name
            ))
        );
    }
    Ok(())
}

pub fn logout(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    ctx.bank.logout();
    config::clear_token(&ctx.resolved.profile_name)?;
    if !global.quiet {
        eprintln!("{}", output::success("✓ Logged out"));
    }
    Ok(())
}

pub async fn transactions(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let txs = ctx.bank.transactions().await.map_err(|e| match e {
        CoreError::NotLoggedIn => ctx.not_logged_in(),
        other => other.into(),
    })?;

    if txs.is_empty() && matches!(global.output, crate::cli::OutputFormat::Table) {
        if !global.quiet {
            eprintln!("No movements yet");
        }
        return Ok(());
    }

    let out = output::render_list(
        &global.output,
        &txs,
        |t| TransactionRow::from(t),
        |t| t.id.clone().unwrap_or_default(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
