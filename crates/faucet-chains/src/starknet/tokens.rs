//! Tokens distributed on Starknet networks.

use crate::error::ChainError;
use std::fmt;
use std::str::FromStr;

/// Token symbols known to the Starknet backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenSymbol {
    Eth,
    Strk,
}

impl TokenSymbol {
    pub const ALL: [TokenSymbol; 2] = [TokenSymbol::Eth, TokenSymbol::Strk];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSymbol::Eth => "ETH",
            TokenSymbol::Strk => "STRK",
        }
    }
}

impl FromStr for TokenSymbol {
    type Err = ChainError;

    /// Case-insensitive: `"eth"`, `"Eth"` and `"ETH"` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ETH" => Ok(TokenSymbol::Eth),
            "STRK" => Ok(TokenSymbol::Strk),
            _ => Err(ChainError::UnsupportedToken(s.to_string())),
        }
    }
}

impl fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
