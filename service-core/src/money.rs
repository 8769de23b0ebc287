//! Currency rounding and display formatting shared by every service.
//!
//! All monetary derivation rounds through [`round_cents`] so the platform has
//! a single two-decimal policy instead of ad-hoc rounding at call sites.
//! Display formatting follows the fr-BE convention used by the platform
//! (non-breaking-space thousands separator, comma decimals, trailing symbol
//! for EUR).

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a monetary amount to two decimals, half away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount for display. EUR renders as `1 234,56 €`; any other
/// currency falls back to `<code> 1 234,56`.
pub fn format_amount(amount: Decimal, currency: &str) -> String {
    let rounded = round_cents(amount);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let rendered = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));

    let digits = int_part.as_bytes();
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('\u{00a0}');
        }
        grouped.push(*digit as char);
    }

    let body = format!("{}{},{}", if negative { "-" } else { "" }, grouped, frac_part);
    match currency {
        "EUR" | "" => format!("{}\u{00a0}€", body),
        other => format!("{} {}", other, body),
    }
}
