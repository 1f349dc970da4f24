//! Starknet chain configuration.

use crate::config::{find_token, ChainPolicy, PolicySource, SecretSource, TokenPolicy};
use crate::error::ChainResult;
use crate::units::DEFAULT_DECIMALS;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Prefix of the environment variables holding Starknet secrets:
/// `STARKNET_RPC_URL`, `STARKNET_PRIVATE_KEY` and `STARKNET_ADDRESS`.
pub const ENV_PREFIX: &str = "STARKNET";

/// Configuration for a Starknet faucet account. Built once, never mutated.
#[derive(Clone)]
pub struct StarknetConfig {
    /// Network name (sepolia, mainnet)
    pub network: String,

    /// JSON-RPC endpoint URL
    pub rpc_url: String,

    /// Faucet account private key, hex with `0x` or decimal
    pub private_key: String,

    /// Faucet account address
    pub address: String,

    /// Token symbol to distribution policy
    pub tokens: BTreeMap<String, TokenPolicy>,

    pub min_balance_protect_pct: u8,

    /// Base URL for transaction links; empty selects the Voyager default
    pub explorer_url: String,

    pub request_timeout: Duration,

    pub confirmation_interval: Duration,
}

impl fmt::Debug for StarknetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StarknetConfig")
            .field("network", &self.network)
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &"<redacted>")
            .field("address", &self.address)
            .field("tokens", &self.tokens)
            .field("min_balance_protect_pct", &self.min_balance_protect_pct)
            .field("explorer_url", &self.explorer_url)
            .field("request_timeout", &self.request_timeout)
            .field("confirmation_interval", &self.confirmation_interval)
            .finish()
    }
}

impl StarknetConfig {
    /// Load the policy file and merge in secrets. Fails on the first
    /// missing secret.
    pub fn load(policy: &PolicySource, secrets: &SecretSource) -> ChainResult<Self> {
        let policy = ChainPolicy::load(policy)?;
        Self::from_parts(policy, secrets)
    }

    /// Merge an already loaded policy with secrets.
    pub fn from_parts(policy: ChainPolicy, secrets: &SecretSource) -> ChainResult<Self> {
        let secrets = secrets.read(ENV_PREFIX)?;
        let rpc_url = secrets.require("rpc_url")?;
        let private_key = secrets.require("private_key")?;
        let address = secrets.require("address")?;

        Ok(Self {
            network: policy.chain_id,
            rpc_url,
            private_key,
            address,
            tokens: policy.tokens,
            min_balance_protect_pct: policy.min_balance_protect_pct,
            explorer_url: policy.explorer_url,
            request_timeout: Duration::from_secs(policy.request_timeout_secs),
            confirmation_interval: Duration::from_secs(policy.confirmation_poll_secs),
        })
    }

    /// Token policy, matched case-insensitively.
    pub fn token(&self, token: &str) -> Option<&TokenPolicy> {
        find_token(&self.tokens, token)
    }

    /// Drip amount as configured, `"0"` for unknown tokens.
    pub fn drip_amount(&self, token: &str) -> &str {
        self.token(token).map_or("0", |t| t.drip_amount.as_str())
    }

    pub fn token_address(&self, token: &str) -> Option<&str> {
        self.token(token).map(|t| t.contract_address.as_str())
    }

    pub fn max_per_hour(&self, token: &str) -> f64 {
        self.token(token).map_or(0.0, |t| t.max_per_hour)
    }

    pub fn max_per_day(&self, token: &str) -> f64 {
        self.token(token).map_or(0.0, |t| t.max_per_day)
    }

    pub fn decimals(&self, token: &str) -> u8 {
        self.token(token)
            .and_then(|t| t.decimals)
            .unwrap_or(DEFAULT_DECIMALS)
    }
}
