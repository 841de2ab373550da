//! Account command handlers.

use cajero_core::money::{censor_number, format_card_number, format_cop, mask_card_number};
use cajero_core::{Account, CoreError, NewAccount, Provider, validate};

use crate::cli::{AccountArgs, AccountCommand, CreateAccountArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

// ── Detail view ─────────────────────────────────────────────────────

pub(crate) fn account_detail(account: &Account, reveal: bool) -> String {
    let mask = |n: &str| {
        if reveal {
            n.to_owned()
        } else {
            censor_number(n)
        }
    };

    let mut pairs = vec![
        ("Name", account.name.clone()),
        ("Account", mask(&account.number)),
    ];
    if let Some(kind) = account.kind {
        pairs.push(("Type", Provider::from(kind).brand().name.to_owned()));
    }
    if let Some(ref phone) = account.phone {
        pairs.push(("Phone", phone.clone()));
    }
    pairs.push(("Balance", format_cop(account.balance)));
    if let Some(ref card) = account.card_number {
        let shown = if reveal {
            format_card_number(card)
        } else {
            mask_card_number(card)
        };
        pairs.push(("Card", shown));
    }
    if let Some(ref expiry) = account.card_expiry {
        pairs.push(("Expires", expiry.clone()));
    }
    if reveal {
        if let Some(ref cvv) = account.cvv {
            pairs.push(("CVV", cvv.clone()));
        }
    }
    if !account.history.is_empty() {
        pairs.push(("Movements", account.history.len().to_string()));
    }

    output::detail_block(&pairs)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context, args: AccountArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AccountCommand::Create(create) => create_account(ctx, create, global).await,

        AccountCommand::Show { reveal } => {
            let account = ctx.bank.profile().await.map_err(|e| match e {
                CoreError::NotLoggedIn => ctx.not_logged_in(),
                other => other.into(),
            })?;
            let out = output::render_single(
                &global.output,
                &account,
                |a| account_detail(a, reveal),
                |a| a.number.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AccountCommand::Lookup { number, reveal } => {
            let account = ctx.bank.lookup_account(&number).await?;
            let out = output::render_single(
                &global.output,
                &account,
                |a| account_detail(a, reveal),
                |a| a.number.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

async fn create_account(
    ctx: &Context,
    args: CreateAccountArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let provider = ctx.resolved.provider;
    let initial_balance = validate::parse_amount(&args.balance)?;
    let pin = util::read_pin(args.pin, "Choose a 4-digit PIN: ")?;

    let account = ctx
        .bank
        .register(NewAccount {
            name: args.name,
            document: args.document,
            birth_date: args.birth_date,
            phone: args.phone,
            initial_balance,
            pin,
            kind: provider.kind(),
        })
        .await?;

    if !global.quiet {
        eprintln!(
            "{}",
            output::success(&format!("✓ {} account created", provider.brand().name))
        );
    }

    // New card details are shown in full once; they can't be fetched later.
    let reveal = provider == Provider::Tarjeta;
    let out = output::render_single(
        &global.output,
        &account,
        |a| account_detail(a, reveal),
        |a| a.number.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn card_account() -> Account {
        serde_json::from_value(serde_json::json!({
            "numero": "4000123412341234",
            "nombre": "Luis",
            "tipo": "tarjeta",
            "monto": 150000,
            "numeroTarjeta": "4000123412341234",
            "cvv": "321",
            "fechaVencimiento": "10/30"
        }))
        .unwrap()
    }

    #[test]
    fn masked_detail_hides_numbers_and_cvv() {
        let out = account_detail(&card_account(), false);
        assert!(out.contains("************1234"));
        assert!(out.contains("**** **** **** 1234"));
        assert!(!out.contains("321"));
        assert!(out.contains("$ 150.000"));
    }

    #[test]
    fn revealed_detail_groups_card_number() {
        let out = account_detail(&card_account(), true);
        assert!(out.contains("4000 1234 1234 1234"));
        assert!(out.contains("CVV:"));
    }
}
