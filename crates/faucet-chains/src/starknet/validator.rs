//! Starknet address and token validation.

use super::tokens::TokenSymbol;
use crate::error::{ChainError, ChainResult};

/// Length of a normalized address: `0x` followed by 64 hex digits.
pub const NORMALIZED_ADDRESS_LEN: usize = 66;

const MAX_HEX_DIGITS: usize = 64;

/// Validate a Starknet address: `0x` followed by 1 to 64 hex digits.
pub fn validate_address(address: &str) -> ChainResult<()> {
    if address.is_empty() {
        return Err(ChainError::EmptyAddress);
    }

    let Some(hex) = address.strip_prefix("0x") else {
        return Err(ChainError::MissingPrefix(address.to_string()));
    };

    if hex.is_empty()
        || hex.len() > MAX_HEX_DIGITS
        || !hex.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return Err(ChainError::MalformedAddress(address.to_string()));
    }

    Ok(())
}

/// Left-pad an address to 66 characters. Addresses already that long are
/// returned unchanged.
pub fn normalize_address(address: &str) -> String {
    if address.len() >= NORMALIZED_ADDRESS_LEN {
        return address.to_string();
    }

    let hex = address.strip_prefix("0x").unwrap_or(address);
    format!("0x{:0>width$}", hex, width = MAX_HEX_DIGITS)
}

/// Check a token symbol against the Starknet token set, ignoring case.
pub fn validate_token(token: &str) -> ChainResult<()> {
    token.parse::<TokenSymbol>().map(|_| ())
}
