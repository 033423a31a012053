//! Amount text <-> U256 base units
//!
//! Accepted forms:
//! - `1000`       base units
//! - `0x3e8`      base units, hex
//! - `1.5 edt`    token units, scaled by 10^18 (suffix is case-insensitive)

use alloy_primitives::U256;
use thiserror::Error;

/// EDT follows the usual ERC-20 18-decimal layout
pub const EDT_DECIMALS: usize = 18;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("amount cannot be negative")]
    Negative,

    #[error("fractional amounts need the `edt` unit (got {0})")]
    Fractional(String),

    #[error("too many decimal places (max {EDT_DECIMALS})")]
    TooPrecise,

    #[error("amount does not fit in 256 bits")]
    Overflow,

    #[error("invalid amount: {0}")]
    Invalid(String),
}

/// Parse user-entered amount text into base units
pub fn parse_amount(input: &str) -> Result<U256, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(AmountError::Negative);
    }

    let lower = trimmed.to_ascii_lowercase();
    if let Some(value) = lower.strip_suffix("edt") {
        return parse_token_units(value.trim());
    }

    if let Some(hex_str) = lower.strip_prefix("0x") {
        return parse_hex(hex_str);
    }

    if trimmed.contains('.') {
        return Err(AmountError::Fractional(trimmed.to_string()));
    }
    parse_digits(trimmed)
}

/// Render base units as EDT with trailing zeros trimmed
pub fn format_edt(value: U256) -> String {
    let divisor = U256::from(10u64).pow(U256::from(EDT_DECIMALS));
    let whole = value / divisor;
    let frac = value % divisor;

    if frac.is_zero() {
        return whole.to_string();
    }
    let frac_str = format!("{:0>width$}", frac.to_string(), width = EDT_DECIMALS);
    format!("{}.{}", whole, frac_str.trim_end_matches('0'))
}

fn parse_token_units(value: &str) -> Result<U256, AmountError> {
    if value.is_empty() {
        return Err(AmountError::Empty);
    }
    let (integer_part, decimal_part) = match value.find('.') {
        Some(pos) => (&value[..pos], &value[pos + 1..]),
        None => (value, ""),
    };
    if decimal_part.len() > EDT_DECIMALS {
        return Err(AmountError::TooPrecise);
    }
    if integer_part.is_empty() && decimal_part.is_empty() {
        return Err(AmountError::Invalid(value.to_string()));
    }

    let integer = if integer_part.is_empty() {
        U256::ZERO
    } else {
        parse_digits(integer_part)?
    };
    let fraction = if decimal_part.is_empty() {
        U256::ZERO
    } else {
        let padded = format!("{:0<width$}", decimal_part, width = EDT_DECIMALS);
        parse_digits(&padded)?
    };

    let scale = U256::from(10u64).pow(U256::from(EDT_DECIMALS));
    integer
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction))
        .ok_or(AmountError::Overflow)
}

fn parse_digits(digits: &str) -> Result<U256, AmountError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::Invalid(digits.to_string()));
    }
    // Only digits remain, so the sole failure mode is width.
    U256::from_str_radix(digits, 10).map_err(|_| AmountError::Overflow)
}

fn parse_hex(hex_str: &str) -> Result<U256, AmountError> {
    if hex_str.is_empty() || !hex_str.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(AmountError::Invalid(format!("0x{hex_str}")));
    }
    U256::from_str_radix(hex_str, 16).map_err(|_| AmountError::Overflow)
}
