//! Starknet implementation of [`Chain`].

use super::config::StarknetConfig;
use super::rpc::{JsonRpcNode, NodeRpc, ReceiptOutcome};
use super::tokens::TokenSymbol;
use super::{uint256, validator};
use crate::chain::Chain;
use crate::error::{ChainError, ChainResult};
use crate::poll::{self, Cancellation};
use crate::units;
use alloy::primitives::U256;
use async_trait::async_trait;
use starknet::core::types::{Call, Felt};
use starknet::macros::selector;
use std::collections::BTreeMap;
use std::future::Future;
use tracing::{debug, info, warn};

const MAINNET_EXPLORER: &str = "https://voyager.online/tx/";
const SEPOLIA_EXPLORER: &str = "https://sepolia.voyager.online/tx/";

/// Starknet chain client holding the faucet account, the node connection
/// and the resolved token contracts. Immutable once built.
pub struct StarknetClient<R = JsonRpcNode> {
    rpc: R,
    config: StarknetConfig,
    faucet_address: Felt,
    token_addresses: BTreeMap<TokenSymbol, Felt>,
}

impl<R> std::fmt::Debug for StarknetClient<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StarknetClient")
            .field("config", &self.config)
            .field("faucet_address", &self.faucet_address)
            .field("token_addresses", &self.token_addresses)
            .finish()
    }
}

impl StarknetClient<JsonRpcNode> {
    /// Connect to the configured node and set up the faucet account.
    pub async fn connect(config: StarknetConfig) -> ChainResult<Self> {
        let private_key = parse_private_key(&config.private_key)?;
        let faucet_address = parse_config_address(&config.address, "faucet address")?;
        let token_addresses = resolve_token_addresses(&config)?;

        let rpc = JsonRpcNode::connect(&config.rpc_url, private_key, faucet_address).await?;

        info!(
            "Starknet client ready on {} for {} ({} tokens)",
            config.network,
            config.address,
            token_addresses.len()
        );

        Ok(Self {
            rpc,
            config,
            faucet_address,
            token_addresses,
        })
    }
}

impl<R: NodeRpc> StarknetClient<R> {
    /// Build a client over an existing node connection.
    pub fn with_rpc(config: StarknetConfig, rpc: R) -> ChainResult<Self> {
        let faucet_address = parse_config_address(&config.address, "faucet address")?;
        let token_addresses = resolve_token_addresses(&config)?;

        Ok(Self {
            rpc,
            config,
            faucet_address,
            token_addresses,
        })
    }

    pub fn config(&self) -> &StarknetConfig {
        &self.config
    }

    /// Configured drip for `token` in base units.
    pub fn drip_amount(&self, token: &str) -> ChainResult<U256> {
        let symbol = self.resolve_token(token)?.0;
        let symbol = symbol.as_str();
        units::parse_units(self.config.drip_amount(symbol), self.config.decimals(symbol))
    }

    /// Balance of the faucet account itself.
    pub async fn faucet_balance(&self, token: &str, cancel: Cancellation) -> ChainResult<U256> {
        let (_, contract) = self.resolve_token(token)?;
        self.balance_of(contract, self.faucet_address, cancel).await
    }

    /// Refuse to distribute once the faucet balance has fallen to
    /// `min_balance_protect_pct` percent of the token's daily cap.
    pub async fn check_reserve(&self, token: &str, cancel: Cancellation) -> ChainResult<()> {
        let (symbol, contract) = self.resolve_token(token)?;
        let pct = self.config.min_balance_protect_pct;
        if pct == 0 {
            return Ok(());
        }

        let decimals = self.config.decimals(symbol.as_str());
        let reserve = units::to_base_units_with(
            self.config.max_per_day(symbol.as_str()) * f64::from(pct) / 100.0,
            decimals,
        )?;
        let balance = self.balance_of(contract, self.faucet_address, cancel).await?;

        if balance <= reserve {
            warn!(
                "Faucet {} balance {} at or below reserve {}",
                symbol,
                units::format_units(balance, decimals),
                units::format_units(reserve, decimals)
            );
            return Err(ChainError::ReserveProtection {
                token: symbol.to_string(),
                balance: units::format_units(balance, decimals),
                reserve: units::format_units(reserve, decimals),
            });
        }

        Ok(())
    }

    fn resolve_token(&self, token: &str) -> ChainResult<(TokenSymbol, Felt)> {
        let symbol: TokenSymbol = token.parse()?;
        self.token_addresses
            .get(&symbol)
            .map(|address| (symbol, *address))
            .ok_or_else(|| ChainError::UnsupportedToken(token.to_string()))
    }

    async fn balance_of(
        &self,
        contract: Felt,
        owner: Felt,
        cancel: Cancellation,
    ) -> ChainResult<U256> {
        let result = self
            .with_timeout(
                "balanceOf",
                cancel,
                || self.rpc.call(contract, selector!("balanceOf"), vec![owner]),
            )
            .await?
            .map_err(|source| ChainError::Query {
                operation: "balanceOf",
                source,
            })?;

        if result.len() < 2 {
            return Err(ChainError::UnexpectedResponse(format!(
                "balanceOf returned {} words, expected a u256 low/high pair",
                result.len()
            )));
        }

        uint256::from_felts(&result[0], &result[1])
    }

    /// Run one node round trip, bounded by the request timeout and cut short
    /// by `cancel`.
    async fn with_timeout<T, Fut>(
        &self,
        operation: &'static str,
        mut cancel: Cancellation,
        request: impl FnOnce() -> Fut,
    ) -> ChainResult<T>
    where
        Fut: Future<Output = T>,
    {
        if cancel.is_cancelled() {
            return Err(ChainError::Cancelled);
        }

        let after = self.config.request_timeout;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("{} cancelled by caller", operation);
                Err(ChainError::Cancelled)
            }
            result = tokio::time::timeout(after, request()) => {
                result.map_err(|_| ChainError::Timeout { operation, after })
            }
        }
    }
}

#[async_trait]
impl<R: NodeRpc> Chain for StarknetClient<R> {
    async fn transfer(
        &self,
        recipient: &str,
        token: &str,
        amount: U256,
        cancel: Cancellation,
    ) -> ChainResult<String> {
        validator::validate_address(recipient)?;
        let (symbol, contract) = self.resolve_token(token)?;
        let recipient_felt = parse_address(recipient)?;

        let [low, high] = uint256::to_felts(amount);
        let call = Call {
            to: contract,
            selector: selector!("transfer"),
            calldata: vec![recipient_felt, low, high],
        };

        let hash = self
            .with_timeout("transfer", cancel, || self.rpc.execute(vec![call]))
            .await?
            .map_err(ChainError::Submission)?;
        let hash = hash.to_fixed_hex_string();

        info!(
            "Transfer sent: {} {} to {} (tx {})",
            units::format_units(amount, self.config.decimals(symbol.as_str())),
            symbol,
            recipient,
            hash
        );
        Ok(hash)
    }

    async fn balance(&self, address: &str, token: &str, cancel: Cancellation) -> ChainResult<U256> {
        validator::validate_address(address)?;
        let (symbol, contract) = self.resolve_token(token)?;
        let owner = parse_address(address)?;

        let balance = self.balance_of(contract, owner, cancel).await?;
        debug!("Balance of {} in {}: {}", address, symbol, balance);
        Ok(balance)
    }

    async fn wait_for_confirmation(&self, tx_hash: &str, cancel: Cancellation) -> ChainResult<()> {
        let hash = Felt::from_hex(tx_hash)
            .map_err(|_| ChainError::InvalidHash(tx_hash.to_string()))?;

        let outcome = poll::poll_until(self.config.confirmation_interval, cancel, move || async move {
            match self.rpc.receipt(hash).await {
                Ok(outcome) => Ok(outcome),
                Err(e) => {
                    warn!("Receipt lookup for {} failed, retrying: {}", tx_hash, e);
                    Ok(None)
                }
            }
        })
        .await?;

        match outcome {
            ReceiptOutcome::Succeeded => {
                info!("Transaction {} confirmed", tx_hash);
                Ok(())
            }
            ReceiptOutcome::Reverted(reason) => Err(ChainError::Reverted {
                hash: tx_hash.to_string(),
                reason,
            }),
        }
    }

    fn validate_address(&self, address: &str) -> ChainResult<()> {
        validator::validate_address(address)
    }

    fn normalize_address(&self, address: &str) -> String {
        validator::normalize_address(address)
    }

    fn validate_token(&self, token: &str) -> ChainResult<()> {
        validator::validate_token(token)
    }

    fn supported_tokens(&self) -> Vec<String> {
        TokenSymbol::ALL.iter().map(|t| t.to_string()).collect()
    }

    fn explorer_url(&self, tx_hash: &str) -> String {
        if !self.config.explorer_url.is_empty() {
            return format!("{}{}", self.config.explorer_url, tx_hash);
        }

        let base = if self.config.network == "mainnet" {
            MAINNET_EXPLORER
        } else {
            SEPOLIA_EXPLORER
        };
        format!("{}{}", base, tx_hash)
    }

    fn chain_name(&self) -> &str {
        "starknet"
    }

    fn network_name(&self) -> &str {
        &self.config.network
    }
}

/// Private keys are accepted as `0x` hex or as a decimal integer.
fn parse_private_key(key: &str) -> ChainResult<Felt> {
    let parsed = match key.strip_prefix("0x") {
        Some(_) => Felt::from_hex(key),
        None => Felt::from_dec_str(key),
    };
    parsed.map_err(|_| ChainError::Config("invalid private key format".to_string()))
}

/// Parse a validated address into a felt. Values at or above the field
/// modulus are rejected instead of reduced.
fn parse_address(address: &str) -> ChainResult<Felt> {
    let malformed = || ChainError::MalformedAddress(address.to_string());

    let hex = address.strip_prefix("0x").ok_or_else(malformed)?;
    let value = U256::from_str_radix(hex, 16).map_err(|_| malformed())?;
    let felt = Felt::from_hex(address).map_err(|_| malformed())?;

    if U256::from_be_bytes(felt.to_bytes_be()) != value {
        return Err(malformed());
    }
    Ok(felt)
}

fn parse_config_address(address: &str, what: &str) -> ChainResult<Felt> {
    validator::validate_address(address)
        .and_then(|_| parse_address(address))
        .map_err(|e| ChainError::Config(format!("invalid {}: {}", what, e)))
}

/// Resolve every configured token the backend knows. Unknown symbols are
/// skipped; a malformed contract address fails the whole resolution.
fn resolve_token_addresses(config: &StarknetConfig) -> ChainResult<BTreeMap<TokenSymbol, Felt>> {
    let mut resolved = BTreeMap::new();

    for (symbol, policy) in &config.tokens {
        let Ok(token) = symbol.parse::<TokenSymbol>() else {
            warn!("Skipping token {} not supported on Starknet", symbol);
            continue;
        };

        let address = parse_config_address(
            &policy.contract_address,
            &format!("{} token address", token),
        )?;
        resolved.insert(token, address);
    }

    Ok(resolved)
}
