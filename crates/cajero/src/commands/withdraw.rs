//! Cash withdrawal with a code or card PIN.

use tabled::Tabled;

use cajero_core::money::{format_cop, format_pesos};
use cajero_core::{Withdrawal, WithdrawalAuth, WithdrawalRequest};

use crate::cli::{GlobalOpts, WithdrawArgs};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

#[derive(Tabled)]
struct BillRow {
    #[tabled(rename = "Denomination")]
    denomination: String,
    #[tabled(rename = "Count")]
    count: u32,
    #[tabled(rename = "Subtotal")]
    subtotal: String,
}

/// Receipt: message, amount, bill table and new balance.
pub(crate) fn render_withdrawal(w: &Withdrawal) -> String {
    let mut pairs = vec![
        ("Account", w.account.clone()),
        ("Amount", format_pesos(w.amount)),
    ];
    if let Some(balance) = w.new_balance {
        pairs.push(("New balance", format_cop(balance)));
    }

    let mut out = format!("{}\n{}", output::emphasis(&w.message), output::detail_block(&pairs));
    if !w.bills.is_empty() {
        let rows: Vec<BillRow> = w
            .bills
            .iter()
            .map(|&(denomination, count)| BillRow {
                denomination: format_pesos(denomination),
                count,
                subtotal: format_pesos(denomination.saturating_mul(u64::from(count))),
            })
            .collect();
        out.push('\n');
        out.push_str(&output::render_table(&rows));
    }
    out
}

pub(crate) fn print_receipt(w: &Withdrawal, global: &GlobalOpts) {
    let out = output::render_single(&global.output, w, render_withdrawal, |w| {
        w.new_balance.map(format_cop).unwrap_or_default()
    });
    output::print_output(&out, global.quiet);
}

pub async fn handle(ctx: &Context, args: WithdrawArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let account = ctx.account(args.account)?;
    let amount = util::withdrawal_amount(&args.amount)?;

    let auth = match args.code {
        Some(code) => WithdrawalAuth::Code(code.trim().to_owned()),
        None if ctx.resolved.provider.uses_withdrawal_code() => {
            WithdrawalAuth::Code(util::prompt_text("Withdrawal code", "--code")?)
        }
        None => WithdrawalAuth::Pin(util::read_pin(args.pin, "Card PIN: ")?),
    };

    if !util::confirm(
        &format!("Withdraw {} from {account}?", format_pesos(amount)),
        global.yes,
    )? {
        return Ok(());
    }

    let withdrawal = ctx
        .bank
        .withdraw(WithdrawalRequest {
            account,
            auth,
            amount,
        })
        .await?;

    print_receipt(&withdrawal, global);
    Ok(())
}
