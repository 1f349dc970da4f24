//! Node RPC access for the Starknet backend.

use crate::error::{ChainError, ChainResult, NodeError};
use async_trait::async_trait;
use starknet::{
    accounts::{Account, ConnectedAccount, ExecutionEncoding, SingleOwnerAccount},
    core::types::{
        BlockId, BlockTag, Call, ExecutionResult, Felt, FunctionCall, StarknetError,
    },
    providers::{
        jsonrpc::{HttpTransport, JsonRpcClient},
        Provider, ProviderError,
    },
    signers::{LocalWallet, SigningKey},
};
use tracing::{debug, info};

/// Execution outcome recorded in a transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptOutcome {
    Succeeded,
    Reverted(String),
}

/// The node operations the Starknet client needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// Read-only contract call against the latest block.
    async fn call(
        &self,
        contract: Felt,
        selector: Felt,
        calldata: Vec<Felt>,
    ) -> Result<Vec<Felt>, NodeError>;

    /// Sign and submit `calls` as one invoke transaction, returning its hash.
    async fn execute(&self, calls: Vec<Call>) -> Result<Felt, NodeError>;

    /// Receipt lookup. `None` while the node does not know the transaction.
    async fn receipt(&self, hash: Felt) -> Result<Option<ReceiptOutcome>, NodeError>;
}

type HttpProvider = JsonRpcClient<HttpTransport>;

/// JSON-RPC node connection with the faucet's single-owner account.
pub struct JsonRpcNode {
    account: SingleOwnerAccount<HttpProvider, LocalWallet>,
}

impl std::fmt::Debug for JsonRpcNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcNode")
            .field("address", &self.account.address())
            .field("chain_id", &self.account.chain_id())
            .finish()
    }
}

impl JsonRpcNode {
    /// Connect to `rpc_url` and set up the signing account. The chain id is
    /// fetched here, so an unreachable endpoint fails construction.
    pub async fn connect(rpc_url: &str, private_key: Felt, address: Felt) -> ChainResult<Self> {
        let url = url::Url::parse(rpc_url)
            .map_err(|e| ChainError::Config(format!("Invalid RPC URL: {}", e)))?;
        let provider = JsonRpcClient::new(HttpTransport::new(url));

        let chain_id = provider
            .chain_id()
            .await
            .map_err(|e| ChainError::Connection(format!("{}: {}", rpc_url, e)))?;
        info!("Connected to Starknet node, chain id {}", chain_id.to_hex_string());

        let signer = LocalWallet::from(SigningKey::from_secret_scalar(private_key));
        let account =
            SingleOwnerAccount::new(provider, signer, address, chain_id, ExecutionEncoding::New);

        Ok(Self { account })
    }
}

#[async_trait]
impl NodeRpc for JsonRpcNode {
    async fn call(
        &self,
        contract: Felt,
        selector: Felt,
        calldata: Vec<Felt>,
    ) -> Result<Vec<Felt>, NodeError> {
        let request = FunctionCall {
            contract_address: contract,
            entry_point_selector: selector,
            calldata,
        };

        Ok(self
            .account
            .provider()
            .call(request, BlockId::Tag(BlockTag::Latest))
            .await?)
    }

    async fn execute(&self, calls: Vec<Call>) -> Result<Felt, NodeError> {
        let result = self
            .account
            .execute_v3(calls)
            .send()
            .await
            .map_err(|e| NodeError::Account(e.to_string()))?;

        Ok(result.transaction_hash)
    }

    async fn receipt(&self, hash: Felt) -> Result<Option<ReceiptOutcome>, NodeError> {
        match self.account.provider().get_transaction_receipt(hash).await {
            Ok(receipt) => {
                let outcome = match receipt.receipt.execution_result() {
                    ExecutionResult::Succeeded => ReceiptOutcome::Succeeded,
                    ExecutionResult::Reverted { reason } => ReceiptOutcome::Reverted(reason.clone()),
                };
                Ok(Some(outcome))
            }
            Err(ProviderError::StarknetError(StarknetError::TransactionHashNotFound)) => {
                debug!("Transaction {} not yet known to the node", hash.to_hex_string());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
