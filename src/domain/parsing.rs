//! Permissive numeric parsing for user-entered fields
//!
//! Form fields arrive as free text. A field counts as numeric when it starts
//! with a number; trailing garbage is ignored ("250g" reads as 250), and a
//! field with no leading number has no value at all.

use regex::Regex;
use std::sync::LazyLock;

static LEADING_FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)").unwrap()
});

static LEADING_INT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*([+-]?[0-9]+)").unwrap());

/// Parse the leading decimal number of `input`, if any.
pub fn parse_leading_float(input: &str) -> Option<f64> {
    let number = LEADING_FLOAT.captures(input)?.get(1)?;
    number.as_str().parse().ok()
}

/// Parse the leading integer of `input`, if any.
pub fn parse_leading_int(input: &str) -> Option<i64> {
    let number = LEADING_INT.captures(input)?.get(1)?;
    number.as_str().parse().ok()
}

/// Whole, non-negative count from a form field; blank or malformed is 0.
pub fn parse_count_or_zero(input: &str) -> u64 {
    parse_leading_int(input)
        .and_then(|value| u64::try_from(value).ok())
        .unwrap_or(0)
}

/// Step water in grams: blank means "no water", malformed means 0.
pub fn parse_step_water(input: &str) -> Option<u32> {
    if input.trim().is_empty() {
        return None;
    }
    Some(
        parse_leading_int(input)
            .and_then(|value| u32::try_from(value).ok())
            .unwrap_or(0),
    )
}

/// Render `value` with a fixed number of decimals.
///
/// The exact binary value is rounded, so 1.45 (stored just below the half)
/// shows as "1.4". Exact halves round away from zero.
pub fn to_fixed(value: f64, decimals: usize) -> String {
    let places = decimals as i32;
    let scaled = value * 10f64.powi(places);
    let is_half = (value * 2f64.powi(places + 1)).fract() == 0.0 && scaled.fract().abs() == 0.5;
    if is_half {
        let rounded = scaled.round() / 10f64.powi(places);
        return format!("{rounded:.decimals$}");
    }
    format!("{value:.decimals$}")
}
