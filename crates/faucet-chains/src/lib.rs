//! # Faucet Chains
//!
//! Chain clients for a multi-network testnet faucet. Every network backend
//! implements the [`Chain`] trait: validating and normalizing addresses,
//! sending token transfers, reading balances and waiting for transactions
//! to confirm.
//!
//! ## Components
//!
//! - [`units`]: decimal amounts to and from base units (18 decimals by default)
//! - [`config`]: static distribution policy plus secrets from the environment
//! - [`chain`]: the [`Chain`] trait
//! - [`poll`]: cancellable fixed-interval polling used for confirmations
//! - [`starknet`]: the Starknet backend
//!
//! ## Usage
//!
//! ```rust,no_run
//! use faucet_chains::config::{PolicySource, SecretSource};
//! use faucet_chains::poll::cancellation;
//! use faucet_chains::starknet::{StarknetClient, StarknetConfig};
//! use faucet_chains::{units, Chain};
//!
//! # async fn run() -> faucet_chains::ChainResult<()> {
//! let config = StarknetConfig::load(
//!     &PolicySource::Path("chains/starknet-sepolia/config.json".into()),
//!     &SecretSource::Env,
//! )?;
//! let client = StarknetClient::connect(config).await?;
//!
//! let (_handle, cancel) = cancellation();
//! let amount = units::to_base_units(0.01)?;
//! let tx_hash = client.transfer("0x1234", "ETH", amount, cancel.clone()).await?;
//!
//! client.wait_for_confirmation(&tx_hash, cancel).await?;
//! println!("{}", client.explorer_url(&tx_hash));
//! # Ok(())
//! # }
//! ```

pub mod chain;
pub mod config;
pub mod error;
pub mod poll;
pub mod starknet;
pub mod units;

pub use chain::Chain;
pub use error::{ChainError, ChainResult, NodeError};
pub use poll::{cancellation, CancelHandle, Cancellation};

// Re-export the amount type used across the API
pub use alloy::primitives::U256;
