//! Starknet backend: account-based chains addressed by field elements.
//!
//! Token amounts travel as Cairo `u256` (two 128-bit words), contract entry
//! points are addressed by selector, and transfers are signed by a single
//! owner account held in memory.

pub mod client;
pub mod config;
pub mod rpc;
pub mod tokens;
pub mod uint256;
pub mod validator;

pub use client::StarknetClient;
pub use config::StarknetConfig;
pub use rpc::{JsonRpcNode, NodeRpc, ReceiptOutcome};
pub use tokens::TokenSymbol;
pub use validator::{normalize_address, validate_address, validate_token};
