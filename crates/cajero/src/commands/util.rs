//! Shared helpers for command handlers.

use std::io::IsTerminal;

use dialoguer::Input;
use secrecy::SecretString;

use cajero_core::validate;

use crate::cli::PinArg;
use crate::error::CliError;

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

pub fn require_terminal(what: &str, flag: &str) -> Result<(), CliError> {
    if std::io::stdin().is_terminal() {
        Ok(())
    } else {
        Err(CliError::Validation {
            field: what.into(),
            reason: format!("not a terminal; pass {flag}"),
        })
    }
}

/// PIN from `--pin` / `CAJERO_PIN`, otherwise prompted without echo.
pub fn read_pin(arg: PinArg, prompt: &str) -> Result<SecretString, CliError> {
    let pin = match arg.pin {
        Some(pin) => pin,
        None => {
            require_terminal("pin", "--pin or CAJERO_PIN")?;
            rpassword::prompt_password(prompt).map_err(prompt_err)?
        }
    };
    validate::pin(&pin)?;
    Ok(SecretString::from(pin))
}

/// Free-text prompt, used when an optional flag was omitted.
pub fn prompt_text(label: &str, flag: &str) -> Result<String, CliError> {
    require_terminal(label, flag)?;
    let value: String = Input::new()
        .with_prompt(label)
        .interact_text()
        .map_err(prompt_err)?;
    Ok(value.trim().to_owned())
}

/// Parse and check a withdrawal amount.
pub fn withdrawal_amount(input: &str) -> Result<u64, CliError> {
    let amount = validate::parse_amount(input)?;
    Ok(validate::withdrawal_amount(amount)?)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    require_terminal("confirmation", "--yes")?;
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)?;
    Ok(confirmed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn pin_from_flag_is_validated() {
        let pin = read_pin(
            PinArg {
                pin: Some("1234".into()),
            },
            "PIN: ",
        )
        .unwrap();
        assert_eq!(pin.expose_secret(), "1234");

        let err = read_pin(
            PinArg {
                pin: Some("12".into()),
            },
            "PIN: ",
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));
    }

    #[test]
    fn amounts_are_parsed_and_checked() {
        assert_eq!(withdrawal_amount("$ 50.000").unwrap(), 50_000);
        assert!(withdrawal_amount("15000").is_err());
        assert!(withdrawal_amount("abc").is_err());
    }
}
