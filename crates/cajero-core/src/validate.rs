// ── Client-side input checks ──
//
// Run before any request leaves the machine. The service re-validates
// everything; these only give faster, clearer feedback.

use chrono::NaiveDate;

use crate::error::CoreError;

/// Smallest bill the ATM hands out; withdrawals are multiples of it.
pub const WITHDRAWAL_STEP: u64 = 10_000;

/// Amount must be positive, at least 10 000 and a multiple of 10 000.
pub fn withdrawal_amount(amount: u64) -> Result<u64, CoreError> {
    if amount == 0 {
        return Err(CoreError::validation("enter a valid amount"));
    }
    if amount < WITHDRAWAL_STEP || amount % WITHDRAWAL_STEP != 0 {
        return Err(CoreError::validation(
            "the amount must be a multiple of 10.000",
        ));
    }
    Ok(amount)
}

/// Parse user input such as `"50000"`, `"50.000"` or `"$ 50.000"`.
pub fn parse_amount(input: &str) -> Result<u64, CoreError> {
    let cleaned: String = input
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | ' ' | '_'))
        .collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::validation(format!(
            "'{}' is not a valid amount",
            input.trim()
        )));
    }
    cleaned
        .parse()
        .map_err(|_| CoreError::validation("amount is too large"))
}

/// Exactly four ASCII digits.
pub fn pin(pin: &str) -> Result<(), CoreError> {
    if pin.len() == 4 && pin.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(CoreError::validation("the PIN must be exactly 4 digits"))
    }
}

/// Exactly ten ASCII digits.
pub fn phone(phone: &str) -> Result<(), CoreError> {
    if phone.len() == 10 && phone.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(CoreError::validation("the phone number must be 10 digits"))
    }
}

pub fn non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        Err(CoreError::validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

/// `YYYY-MM-DD`, not in the future.
pub fn birth_date(value: &str) -> Result<NaiveDate, CoreError> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| CoreError::validation("birth date must look like YYYY-MM-DD"))?;
    if date > chrono::Local::now().date_naive() {
        return Err(CoreError::validation("birth date is in the future"));
    }
    Ok(date)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn amounts() {
        assert!(withdrawal_amount(0).is_err());
        assert!(withdrawal_amount(5_000).is_err());
        assert!(withdrawal_amount(15_000).is_err());
        assert_eq!(withdrawal_amount(10_000).unwrap(), 10_000);
        assert_eq!(withdrawal_amount(70_000).unwrap(), 70_000);
    }

    #[test]
    fn amount_parsing() {
        assert_eq!(parse_amount("50000").unwrap(), 50_000);
        assert_eq!(parse_amount("$ 50.000").unwrap(), 50_000);
        assert_eq!(parse_amount(" 1,000,000 ").unwrap(), 1_000_000);
        assert!(parse_amount("").is_err());
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn pins_and_phones() {
        assert!(pin("1234").is_ok());
        assert!(pin("123").is_err());
        assert!(pin("12a4").is_err());
        assert!(pin("12345").is_err());
        assert!(phone("3001234567").is_ok());
        assert!(phone("300123456").is_err());
        assert!(phone("30012345678").is_err());
    }

    #[test]
    fn required_fields_and_dates() {
        assert!(non_empty("name", "  ").is_err());
        assert!(non_empty("name", "Ana").is_ok());
        assert!(birth_date("1990-04-12").is_ok());
        assert!(birth_date("12/04/1990").is_err());
        assert!(birth_date("2999-01-01").is_err());
    }
}
