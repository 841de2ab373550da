//! Withdrawal code issuance and the live countdown.

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use cajero_core::money::format_pesos;
use cajero_core::{CodeSession, IssuedCode, SessionSnapshot, SessionState};

use crate::cli::{CodeArgs, CodeCommand, GenerateCodeArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

/// What `code generate` prints in structured formats.
#[derive(Debug, Serialize)]
struct CodeView {
    account: String,
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<u64>,
    validity_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<String>,
}

impl CodeView {
    fn new(issued: &IssuedCode, snap: &SessionSnapshot) -> Self {
        Self {
            account: issued.account.clone(),
            code: issued.code.clone(),
            amount: snap.amount,
            validity_secs: snap.validity_secs,
            expires_at: expires_at(snap).map(|t| t.to_rfc3339()),
        }
    }
}

fn expires_at(snap: &SessionSnapshot) -> Option<chrono::DateTime<Local>> {
    let issued = snap.issued_at?;
    let validity = chrono::Duration::try_seconds(i64::try_from(snap.validity_secs).ok()?)?;
    Some((issued + validity).with_timezone(&Local))
}

/// Key/value card for a freshly issued code.
pub(crate) fn code_card(issued: &IssuedCode, snap: &SessionSnapshot) -> String {
    let mut pairs = vec![
        ("Account", issued.account.clone()),
        ("Code", output::emphasis(&issued.code)),
        ("Valid for", snap.remaining_formatted()),
    ];
    if let Some(at) = expires_at(snap) {
        pairs.push(("Expires", at.format("%H:%M:%S").to_string()));
    }
    if let Some(amount) = snap.amount {
        pairs.push(("Amount", format_pesos(amount)));
    }
    output::detail_block(&pairs)
}

pub async fn handle(ctx: &Context, args: CodeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        CodeCommand::Generate(args) => generate(ctx, args, global).await,
    }
}

async fn generate(
    ctx: &Context,
    args: GenerateCodeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let provider = ctx.resolved.provider;
    if !provider.uses_withdrawal_code() {
        return Err(CliError::Validation {
            field: "provider".into(),
            reason: format!("{} withdrawals use the card PIN, not a code", provider.brand().name),
        });
    }

    let account = ctx.account(args.account)?;
    let amount = args
        .amount
        .as_deref()
        .map(util::withdrawal_amount)
        .transpose()?;
    let pin = util::read_pin(args.pin, "PIN: ")?;

    let issued = ctx.bank.generate_withdrawal_code(&account, &pin).await?;

    let session = ctx.bank.code_session();
    session.start(issued.code.clone(), amount);

    if args.copy_only {
        if let Some(code) = session.request_copy() {
            output::print_output(&code, false);
        }
        session.close();
        return Ok(());
    }

    let snap = session.snapshot();
    let out = output::render_single(
        &global.output,
        &CodeView::new(&issued, &snap),
        |_| code_card(&issued, &snap),
        |v| v.code.clone(),
    );
    output::print_output(&out, global.quiet);

    if args.watch && matches!(global.output, OutputFormat::Table) && !global.quiet {
        let last = watch_countdown(&session).await?;
        if last.is_expired() {
            eprintln!("{}", output::warning("! Code expired; generate a new one"));
        }
    }

    session.close();
    Ok(())
}

/// Render the session's countdown until it expires or Ctrl-C is pressed.
pub(crate) async fn watch_countdown(session: &CodeSession) -> Result<SessionSnapshot, CliError> {
    let mut rx = session.subscribe();
    let validity = rx.borrow().validity_secs;

    let bar = ProgressBar::new(validity);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:30.cyan/blue}]")
            .map_err(|e| CliError::Internal(format!("progress template: {e}")))?
            .progress_chars("█▉░"),
    );

    loop {
        let snap = rx.borrow_and_update().clone();
        bar.set_position(snap.remaining_secs);
        bar.set_message(format!("Expires in {}", snap.remaining_formatted()));

        if snap.state != SessionState::Active {
            bar.finish_with_message("Expired");
            return Ok(snap);
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                bar.abandon_with_message("Stopped");
                break;
            }
        }
    }

    Ok(session.snapshot())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn card_lists_code_amount_and_validity() {
        let session = CodeSession::new(Duration::from_secs(90));
        session.start("482913", Some(50_000));
        let issued = IssuedCode {
            account: "3001234567".into(),
            code: "482913".into(),
            message: None,
        };

        let card = code_card(&issued, &session.snapshot());
        assert!(card.contains("482913"));
        assert!(card.contains("01:30"));
        assert!(card.contains("$ 50.000"));
        assert!(card.contains("Expires:"));
    }

    #[tokio::test]
    async fn structured_view_carries_expiry() {
        let session = CodeSession::new(Duration::from_secs(60));
        session.start("111222", None);
        let issued = IssuedCode {
            account: "3001234567".into(),
            code: "111222".into(),
            message: None,
        };

        let view = CodeView::new(&issued, &session.snapshot());
        assert_eq!(view.validity_secs, 60);
        assert!(view.amount.is_none());
        assert!(view.expires_at.is_some());
    }
}
