//! Response formatting
//!
//! Every numeric answer is rendered with two decimals and wrapped in `**…**`
//! so chat clients show it in bold.

use crate::models::Currency;

/// Fixed-decimal rendering that keeps non-finite values readable.
///
/// Exact ties round away from zero (`0.125` → `0.13`); `{:.N}` alone would
/// round them to even.
pub fn fixed(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if value == 0.0 {
        // avoid "-0.00"
        format!("{:.*}", decimals, 0.0)
    } else if is_tie(value, decimals) {
        // the next double away from zero is past the midpoint
        let nudged = f64::from_bits(value.to_bits() + 1);
        format!("{:.*}", decimals, nudged)
    } else {
        format!("{:.*}", decimals, value)
    }
}

/// True when `value` lies exactly halfway between two `decimals`-digit
/// numbers, i.e. `value * 2 * 10^decimals` is an odd integer.
fn is_tie(value: f64, decimals: usize) -> bool {
    let bits = value.abs().to_bits();
    let exp_bits = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if exp_bits == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), exp_bits - 1075)
    };
    if mantissa == 0 {
        return false;
    }

    // value * 2 * 10^d = mantissa * 5^d * 2^(exponent + 1 + d), and 5^d is odd
    let shift = exponent + 1 + decimals as i64;
    shift <= 0 && i64::from(mantissa.trailing_zeros()) == -shift
}

/// Whole-number rendering for counts and echoed operands; `-0` prints as `0`.
fn whole(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else if value.is_finite() {
        format!("{}", value)
    } else {
        fixed(value, 0)
    }
}

pub fn number(value: f64) -> String {
    format!("**{}**", fixed(value, 2))
}

pub fn percent(value: f64) -> String {
    format!("**{}%**", fixed(value, 2))
}

pub fn money(value: f64) -> String {
    format!("**${}**", fixed(value, 2))
}

pub fn money_in(value: f64, currency: Currency) -> String {
    format!("**${} {}**", fixed(value, 2), currency)
}

/// Break-even counts are whole units, already rounded up by the caller.
pub fn units(value: f64) -> String {
    format!("**{} units**", whole(value))
}

/// Operand echo used in explanations: integers without decimals.
pub fn operand(value: f64) -> String {
    whole(value)
}

/// Confirmation for a manual USD→CAD override
pub fn rate_updated(usd_to_cad: f64) -> String {
    format!(
        "✅ **Exchange Rate Updated**\n\n1 USD = ${} CAD\n1 CAD = ${} USD\n\nThis rate will be used for all conversions until the session ends.",
        fixed(usd_to_cad, 4),
        fixed(1.0 / usd_to_cad, 4),
    )
}
