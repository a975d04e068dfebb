//! Number extraction
//!
//! Pulls unsigned decimal literals out of free text, in the order they appear.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DECIMAL_LITERAL: Regex = Regex::new(r"[0-9]+\.?[0-9]*").expect("valid decimal pattern");
}

/// Extract every decimal literal from `text`, left to right.
///
/// No sign, thousands separator or exponent is recognised, so "-5" yields 5
/// and "1,200" yields 1 and 200. Never fails; an empty vector means no digits.
pub fn extract_numbers(text: &str) -> Vec<f64> {
    DECIMAL_LITERAL
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}
