// ── Peso formatting and number masking ──

use tracing::warn;

use cajero_api::DispensedBills;

/// `1234567` → `"1.234.567"`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Whole pesos, e.g. `50000` → `"$ 50.000"`.
pub fn format_pesos(value: u64) -> String {
    format!("$ {}", group_thousands(value))
}

/// A balance as the service reports it, rounded to whole pesos.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
pub fn format_cop(amount: f64) -> String {
    if !amount.is_finite() {
        return "$ --".into();
    }
    let rounded = amount.round();
    let magnitude = rounded.abs() as u64;
    if rounded < 0.0 {
        format!("-{}", format_pesos(magnitude))
    } else {
        format_pesos(magnitude)
    }
}

/// Replace all but the last four characters with `*`.
pub fn censor_number(number: &str) -> String {
    let len = number.chars().count();
    number
        .chars()
        .enumerate()
        .map(|(i, c)| if i + 4 < len { '*' } else { c })
        .collect()
}

/// Digits in groups of four: `"4000123412341234"` → `"4000 1234 1234 1234"`.
pub fn format_card_number(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(char::is_ascii_digit).collect();
    digits
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Card number with all but the last group hidden: `"**** **** **** 1234"`.
pub fn mask_card_number(number: &str) -> String {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    let masked: Vec<char> = censor_number(&digits).chars().collect();
    masked
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Bills handed out, largest denomination first.
pub fn bill_breakdown(dispensed: &DispensedBills) -> Vec<(u64, u32)> {
    let mut bills: Vec<(u64, u32)> = dispensed
        .bills
        .iter()
        .filter_map(|(denomination, count)| match denomination.parse::<u64>() {
            Ok(value) => Some((value, *count)),
            Err(_) => {
                warn!(denomination, "skipping unparseable denomination");
                None
            }
        })
        .collect();
    bills.sort_by(|a, b| b.0.cmp(&a.0));
    bills
}
