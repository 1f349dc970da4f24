//! Conversion between human-readable token amounts and base units.
//!
//! Amounts are scaled with exact decimal arithmetic on their shortest decimal
//! representation, so `1.5` becomes exactly `1_500_000_000_000_000_000`.
//! Converting back to `f64` is lossy for values that do not fit in double
//! precision.

use crate::error::{ChainError, ChainResult};
use alloy::primitives::U256;

/// Decimal places used by ETH, STRK and most ERC-20 style tokens.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Convert a decimal amount to base units with 18 decimals.
pub fn to_base_units(amount: f64) -> ChainResult<U256> {
    to_base_units_with(amount, DEFAULT_DECIMALS)
}

/// Convert a decimal amount to base units, truncating digits beyond `decimals`.
pub fn to_base_units_with(amount: f64, decimals: u8) -> ChainResult<U256> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ChainError::InvalidAmount(amount.to_string()));
    }
    if amount == 0.0 {
        return Ok(U256::ZERO);
    }

    scale_decimal(&amount.to_string(), decimals, true)
}

/// Convert base units with 18 decimals to a decimal amount.
pub fn to_decimal(value: U256) -> f64 {
    to_decimal_with(value, DEFAULT_DECIMALS)
}

/// Convert base units to a decimal amount.
pub fn to_decimal_with(value: U256, decimals: u8) -> f64 {
    format_units(value, decimals).parse().unwrap_or(f64::NAN)
}

/// Parse an exact decimal string such as `"0.01"` into base units.
///
/// Unlike [`to_base_units_with`], digits beyond `decimals` are rejected
/// rather than truncated.
pub fn parse_units(amount: &str, decimals: u8) -> ChainResult<U256> {
    scale_decimal(amount, decimals, false)
}

/// Render base units as a decimal string without trailing zeros.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (whole, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');

    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{frac}")
    }
}

fn scale_decimal(amount: &str, decimals: u8, truncate: bool) -> ChainResult<U256> {
    let invalid = || ChainError::InvalidAmount(amount.to_string());

    let trimmed = amount.trim();
    let (whole, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let decimals = decimals as usize;
    let frac = if frac.len() > decimals {
        if !truncate {
            return Err(invalid());
        }
        &frac[..decimals]
    } else {
        frac
    };

    let digits = format!("{whole}{frac:0<decimals$}");
    U256::from_str_radix(&digits, 10).map_err(|_| invalid())
}
