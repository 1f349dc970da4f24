//! Exercises the Starknet backend through the `Chain` trait object with a
//! recording in-memory node.

use async_trait::async_trait;
use faucet_chains::config::{ChainPolicy, PolicySource, SecretSource};
use faucet_chains::starknet::{NodeRpc, ReceiptOutcome, StarknetClient, StarknetConfig};
use faucet_chains::{cancellation, units, Cancellation, Chain, ChainError, NodeError, U256};
use starknet::core::types::{Call, Felt};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const POLICY: &str = r#"{
  "chain_id": "sepolia",
  "tokens": {
    "ETH": {
      "contract_address": "0x049d36570d4e46f48e99674bd3fcc84644ddd6b96f7c741b1562b82f9e004dc7",
      "drip_amount": "0.01",
      "max_per_hour": 1.0,
      "max_per_day": 10.0
    },
    "STRK": {
      "contract_address": "0x04718f5a0fc34cc1af16a1cdee98ffb20c31f5cd61d6ab07201858f4287c938d",
      "drip_amount": "10",
      "max_per_hour": 500.0,
      "max_per_day": 5000.0
    }
  },
  "min_balance_protect_pct": 10,
  "confirmation_poll_secs": 5
}"#;

#[derive(Debug, Clone, PartialEq)]
enum Recorded {
    Call { contract: Felt, calldata: Vec<Felt> },
    Execute { to: Felt, calldata: Vec<Felt> },
    Receipt(Felt),
}

/// In-memory node: balances keyed by owner, receipts become available after
/// a configurable number of lookups. A stalled node accepts requests and
/// never answers.
#[derive(Clone, Default)]
struct FakeNode {
    log: Arc<Mutex<Vec<Recorded>>>,
    balances: Arc<Mutex<Vec<(Felt, U256)>>>,
    pending_lookups: Arc<Mutex<u32>>,
    stalled: bool,
}

impl FakeNode {
    fn stalled() -> Self {
        Self {
            stalled: true,
            ..Self::default()
        }
    }

    fn recorded(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    async fn stall_if_configured(&self) {
        if self.stalled {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl NodeRpc for FakeNode {
    async fn call(
        &self,
        contract: Felt,
        _selector: Felt,
        calldata: Vec<Felt>,
    ) -> Result<Vec<Felt>, NodeError> {
        self.log.lock().unwrap().push(Recorded::Call {
            contract,
            calldata: calldata.clone(),
        });
        self.stall_if_configured().await;

        let owner = calldata.first().copied().unwrap_or(Felt::ZERO);
        let balance = self
            .balances
            .lock()
            .unwrap()
            .iter()
            .find(|(address, _)| *address == owner)
            .map(|(_, balance)| *balance)
            .unwrap_or(U256::ZERO);

        let [low, high] = faucet_chains::starknet::uint256::to_felts(balance);
        Ok(vec![low, high])
    }

    async fn execute(&self, calls: Vec<Call>) -> Result<Felt, NodeError> {
        self.log.lock().unwrap().extend(calls.into_iter().map(|call| Recorded::Execute {
            to: call.to,
            calldata: call.calldata,
        }));
        self.stall_if_configured().await;

        Ok(Felt::from_hex("0xfeed").unwrap())
    }

    async fn receipt(&self, hash: Felt) -> Result<Option<ReceiptOutcome>, NodeError> {
        self.log.lock().unwrap().push(Recorded::Receipt(hash));

        let mut pending = self.pending_lookups.lock().unwrap();
        if *pending > 0 {
            *pending -= 1;
            return Err(NodeError::Other("transaction not found".to_string()));
        }
        Ok(Some(ReceiptOutcome::Succeeded))
    }
}

fn secrets() -> SecretSource {
    let mut vars = config::Map::new();
    vars.insert("STARKNET_RPC_URL".to_string(), "http://127.0.0.1:5050/rpc".to_string());
    vars.insert("STARKNET_PRIVATE_KEY".to_string(), "0x71d7bb07b9a64f6f78ac4c816aff4da9".to_string());
    vars.insert("STARKNET_ADDRESS".to_string(), "0x64b48806902a367c8598f4f95c305e8c1a1acba5f082d294a43793113115691".to_string());
    SecretSource::Map(vars)
}

fn load_config() -> StarknetConfig {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(&path, POLICY).unwrap();

    let policy = ChainPolicy::load(&PolicySource::Path(path)).unwrap();
    StarknetConfig::from_parts(policy, &secrets()).unwrap()
}

fn chain(node: FakeNode) -> Box<dyn Chain> {
    Box::new(StarknetClient::with_rpc(load_config(), node).unwrap())
}

#[tokio::test]
async fn transfer_then_read_balance() {
    let node = FakeNode::default();
    let recipient = "0x1abc";
    node.balances
        .lock()
        .unwrap()
        .push((Felt::from_hex(recipient).unwrap(), units::to_base_units(2.5).unwrap()));

    let chain = chain(node.clone());
    let amount = units::to_base_units(1.5).unwrap();

    let hash = chain
        .transfer(recipient, "ETH", amount, Cancellation::never())
        .await
        .unwrap();
    assert_eq!(hash, chain.normalize_address("0xfeed"));

    let balance = chain
        .balance(recipient, "eth", Cancellation::never())
        .await
        .unwrap();
    assert_eq!(units::to_decimal(balance), 2.5);

    let recorded = node.recorded();
    assert_eq!(recorded.len(), 2);
    assert_eq!(
        recorded[0],
        Recorded::Execute {
            to: Felt::from_hex("0x049d36570d4e46f48e99674bd3fcc84644ddd6b96f7c741b1562b82f9e004dc7")
                .unwrap(),
            calldata: vec![
                Felt::from_hex(recipient).unwrap(),
                Felt::from(1_500_000_000_000_000_000u128),
                Felt::ZERO,
            ],
        }
    );
    assert!(matches!(recorded[1], Recorded::Call { .. }));
}

#[tokio::test]
async fn validation_failures_make_no_network_calls() {
    let node = FakeNode::default();
    let chain = chain(node.clone());

    let err = chain
        .transfer("0xzz", "ETH", U256::from(1u64), Cancellation::never())
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = chain
        .transfer("0x1", "DOGE", U256::from(1u64), Cancellation::never())
        .await
        .unwrap_err();
    assert!(matches!(err, ChainError::UnsupportedToken(_)));

    let err = chain.balance("", "STRK", Cancellation::never()).await.unwrap_err();
    assert!(matches!(err, ChainError::EmptyAddress));

    let err = chain
        .wait_for_confirmation("0xnothex", Cancellation::never())
        .await
        .unwrap_err();
    assert!(matches!(err, ChainError::InvalidHash(_)));

    assert!(node.recorded().is_empty());
}

#[tokio::test(start_paused = true)]
async fn confirmation_rides_out_transient_errors() {
    let node = FakeNode::default();
    *node.pending_lookups.lock().unwrap() = 2;
    let chain = chain(node.clone());

    let start = tokio::time::Instant::now();
    chain
        .wait_for_confirmation("0xfeed", Cancellation::never())
        .await
        .unwrap();

    assert_eq!(node.recorded().len(), 3);
    assert!(start.elapsed() >= Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn cancelled_wait_makes_no_network_calls() {
    let node = FakeNode::default();
    let chain = chain(node.clone());

    let (handle, cancel) = cancellation();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.cancel();
    });

    let err = chain.wait_for_confirmation("0xfeed", cancel).await.unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(err, ChainError::Cancelled));
    assert!(node.recorded().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stalled_node_hits_request_timeout() {
    let node = FakeNode::stalled();
    let chain = chain(node.clone());

    let start = tokio::time::Instant::now();
    let err = chain
        .balance("0x1abc", "STRK", Cancellation::never())
        .await
        .unwrap_err();
    assert!(matches!(err, ChainError::Timeout { operation: "balanceOf", .. }));
    assert!(start.elapsed() >= Duration::from_secs(30));

    let err = chain
        .transfer("0x1abc", "ETH", U256::from(1u64), Cancellation::never())
        .await
        .unwrap_err();
    match err {
        ChainError::Timeout { operation, after } => {
            assert_eq!(operation, "transfer");
            assert_eq!(after, Duration::from_secs(30));
        }
        other => panic!("expected Timeout, got {other:?}"),
    }

    assert_eq!(node.recorded().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_in_flight_requests() {
    let node = FakeNode::stalled();
    let chain = chain(node.clone());

    let (handle, cancel) = cancellation();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        handle.cancel();
    });

    let start = tokio::time::Instant::now();
    let err = chain
        .balance("0x1abc", "ETH", cancel.clone())
        .await
        .unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(err, ChainError::Cancelled));
    assert!(start.elapsed() < Duration::from_secs(30));

    let err = chain
        .transfer("0x1abc", "ETH", U256::from(1u64), cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, ChainError::Cancelled));

    // Only the first request reached the node.
    assert_eq!(node.recorded().len(), 1);
}

#[test]
fn pure_operations() {
    let chain = chain(FakeNode::default());

    assert_eq!(chain.chain_name(), "starknet");
    assert_eq!(chain.network_name(), "sepolia");
    assert_eq!(chain.supported_tokens(), vec!["ETH".to_string(), "STRK".to_string()]);
    assert!(chain.validate_token("strk").is_ok());
    assert!(chain.validate_address(&format!("0x{}", "a".repeat(64))).is_ok());

    let normalized = chain.normalize_address("0x1");
    assert_eq!(normalized.len(), 66);
    assert_eq!(chain.normalize_address(&normalized), normalized);

    assert_eq!(
        chain.explorer_url("0xfeed"),
        "https://sepolia.voyager.online/tx/0xfeed"
    );
}
