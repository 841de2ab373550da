//! Guided ATM flow.
//!
//! Code providers: issue a code, show it with its countdown, read it back
//! and redeem it. Debit cards: look the card up and withdraw with the PIN.

use std::io::IsTerminal;

use dialoguer::Input;
use tracing::debug;

use cajero_core::money::{censor_number, format_pesos};
use cajero_core::{CodeSession, WithdrawalAuth, WithdrawalRequest};

use crate::cli::{AtmArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::{Context, code, util, withdraw};

pub async fn handle(ctx: &Context, args: AtmArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let provider = ctx.resolved.provider;
    let brand = provider.brand();

    let account = match args.account.or_else(|| ctx.resolved.account.clone()) {
        Some(a) if !a.trim().is_empty() => a.trim().to_owned(),
        _ => util::prompt_text(brand.login_label, "--account")?,
    };
    let amount = match args.amount {
        Some(a) => util::withdrawal_amount(&a)?,
        None => util::withdrawal_amount(&util::prompt_text("Amount", "--amount")?)?,
    };

    if !global.quiet {
        eprintln!(
            "{} · {} · {}",
            output::emphasis(brand.name),
            censor_number(&account),
            format_pesos(amount)
        );
    }

    let auth = if provider.uses_withdrawal_code() {
        let pin = util::read_pin(args.pin, "PIN: ")?;
        let issued = ctx.bank.generate_withdrawal_code(&account, &pin).await?;

        let session = ctx.bank.code_session();
        session.start(issued.code.clone(), Some(amount));
        if !global.quiet {
            eprintln!("{}", code::code_card(&issued, &session.snapshot()));
        }

        let entered = read_code(&issued.code).await?;
        warn_if_expired(&session, global);
        session.close();
        WithdrawalAuth::Code(entered)
    } else {
        let card = ctx.bank.lookup_account(&account).await?;
        if !global.quiet {
            eprintln!("Card holder: {}", card.name);
        }
        WithdrawalAuth::Pin(util::read_pin(args.pin, "Card PIN: ")?)
    };

    let withdrawal = ctx
        .bank
        .withdraw(WithdrawalRequest {
            account,
            auth,
            amount,
        })
        .await?;

    withdraw::print_receipt(&withdrawal, global);
    Ok(())
}

/// Ask for the code at the "ATM keypad". Without a terminal the issued
/// code is entered as-is.
async fn read_code(issued: &str) -> Result<String, CliError> {
    if !std::io::stdin().is_terminal() {
        debug!("stdin is not a terminal; redeeming the issued code");
        return Ok(issued.to_owned());
    }

    // The prompt blocks; keep it off the runtime so the countdown keeps ticking.
    let entered = tokio::task::spawn_blocking(|| {
        Input::<String>::new()
            .with_prompt("Enter withdrawal code")
            .interact_text()
    })
    .await
    .map_err(|e| CliError::Internal(format!("prompt task failed: {e}")))?
    .map_err(util::prompt_err)?;

    Ok(entered.trim().to_owned())
}

fn warn_if_expired(session: &CodeSession, global: &GlobalOpts) {
    if session.snapshot().is_expired() && !global.quiet {
        eprintln!(
            "{}",
            output::warning("! The code's countdown ran out; sending it anyway")
        );
    }
}
