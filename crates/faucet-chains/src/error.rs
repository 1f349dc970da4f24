//! Error handling for the chain clients.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by the node RPC layer.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error(transparent)]
    Provider(#[from] starknet::providers::ProviderError),

    #[error("Account error: {0}")]
    Account(String),

    #[error("{0}")]
    Other(String),
}

/// Chain client error types
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Failed to connect to node: {0}")]
    Connection(String),

    #[error("Address cannot be empty")]
    EmptyAddress,

    #[error("Address must start with 0x: {0}")]
    MissingPrefix(String),

    #[error("Invalid address format: {0}")]
    MalformedAddress(String),

    #[error("Unsupported token: {0}")]
    UnsupportedToken(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid transaction hash: {0}")]
    InvalidHash(String),

    #[error("Query failed during {operation}: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: NodeError,
    },

    #[error("Transaction submission failed: {0}")]
    Submission(#[source] NodeError),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Unexpected response shape: {0}")]
    UnexpectedResponse(String),

    #[error("Transaction {hash} reverted: {reason}")]
    Reverted { hash: String, reason: String },

    #[error("Confirmation wait cancelled")]
    Cancelled,

    #[error("Faucet {token} balance {balance} is at or below the protected reserve {reserve}")]
    ReserveProtection {
        token: String,
        balance: String,
        reserve: String,
    },
}

impl ChainError {
    /// True for errors raised by input validation, before any network access.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ChainError::EmptyAddress
                | ChainError::MissingPrefix(_)
                | ChainError::MalformedAddress(_)
                | ChainError::UnsupportedToken(_)
                | ChainError::InvalidAmount(_)
                | ChainError::InvalidHash(_)
        )
    }
}

/// Result type alias for chain operations
pub type ChainResult<T> = Result<T, ChainError>;
