//! The capability set every chain backend provides.

use crate::error::ChainResult;
use crate::poll::Cancellation;
use alloy::primitives::U256;
use async_trait::async_trait;

/// A blockchain network the faucet can distribute on.
///
/// Network operations validate their inputs first and return validation
/// errors without touching the node. Each round trip is bounded by the
/// backend's request timeout and ends early with `Cancelled` when the
/// caller's cancellation fires. Amounts are in the token's base units.
#[async_trait]
pub trait Chain: Send + Sync {
    /// Send `amount` of `token` to `recipient`, returning the transaction
    /// hash. Every call submits a new transaction. Cancelling stops waiting
    /// for the node; a transaction it already accepted stays submitted.
    async fn transfer(
        &self,
        recipient: &str,
        token: &str,
        amount: U256,
        cancel: Cancellation,
    ) -> ChainResult<String>;

    /// Balance of `address` in `token`.
    async fn balance(&self, address: &str, token: &str, cancel: Cancellation) -> ChainResult<U256>;

    /// Wait until the transaction reaches a final state or `cancel` fires.
    async fn wait_for_confirmation(&self, tx_hash: &str, cancel: Cancellation) -> ChainResult<()>;

    fn validate_address(&self, address: &str) -> ChainResult<()>;

    /// Canonical form of an already valid address.
    fn normalize_address(&self, address: &str) -> String;

    fn validate_token(&self, token: &str) -> ChainResult<()>;

    fn supported_tokens(&self) -> Vec<String>;

    /// Block explorer link for a transaction.
    fn explorer_url(&self, tx_hash: &str) -> String;

    /// Chain family, e.g. "starknet".
    fn chain_name(&self) -> &str;

    /// Network within the chain, e.g. "sepolia".
    fn network_name(&self) -> &str;
}
