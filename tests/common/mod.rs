//! Shared mocks for integration tests: a scripted wallet and a simulated
//! chain serving the randomness contract.

#![allow(dead_code)]

use alloy::primitives::{Address, Bytes, Log, TxHash, B256, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::{SolCall, SolError, SolEvent, SolValue};
use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

use randomness_client::blockchain::{ChainId, ChainRpc, ConfirmedReceipt, RpcError, RpcResult};
use randomness_client::contract::abi::{
    getGenerationDetailsCall, getRandomNumberCall, selectRandomItemCall, EmptyItemArray, RandomGeneration,
    VerifiableRandomItemSelected, VerifiableRandomNumberGenerated,
};
use randomness_client::network::NetworkDescriptor;
use randomness_client::randomness::RpcConnector;
use randomness_client::wallet::{ProviderError, ProviderEvent, WalletProvider};
use randomness_client::{AppConfig, RandomnessService};

pub const FLOW_MAINNET: u64 = 747;
pub const ACCOUNT: Address = Address::repeat_byte(0xaa);

/// Address of the contract in the default configuration.
pub fn contract_address() -> Address {
    AppConfig::default().contract.address.parse().unwrap()
}

/// Wallet provider that records every interaction.
pub struct MockWallet {
    chain: AtomicU64,
    knows_required: AtomicBool,
    pub reject_accounts: AtomicBool,
    pub reject_transactions: AtomicBool,
    pub tx_hash: Mutex<TxHash>,
    pub prompts: AtomicU32,
    pub switches: AtomicU32,
    pub registrations: AtomicU32,
    pub submissions: Mutex<Vec<TransactionRequest>>,
    events: broadcast::Sender<ProviderEvent>,
}

impl MockWallet {
    /// A wallet on `chain`; `knows_required` says whether Flow mainnet is
    /// already registered in it.
    pub fn on_chain(chain: u64, knows_required: bool) -> Arc<Self> {
        Arc::new(Self {
            chain: AtomicU64::new(chain),
            knows_required: AtomicBool::new(knows_required || chain == FLOW_MAINNET),
            reject_accounts: AtomicBool::new(false),
            reject_transactions: AtomicBool::new(false),
            tx_hash: Mutex::new(TxHash::repeat_byte(0x11)),
            prompts: AtomicU32::new(0),
            switches: AtomicU32::new(0),
            registrations: AtomicU32::new(0),
            submissions: Mutex::new(Vec::new()),
            events: broadcast::channel(16).0,
        })
    }

    pub fn set_tx_hash(&self, hash: TxHash) {
        *self.tx_hash.lock().unwrap() = hash;
    }

    /// Fire a provider notification.
    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    pub fn listeners(&self) -> usize {
        self.events.receiver_count()
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        if self.reject_accounts.load(Ordering::SeqCst) {
            return Err(ProviderError::user_rejected());
        }
        Ok(vec![ACCOUNT])
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        Ok(self.chain.load(Ordering::SeqCst))
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        self.switches.fetch_add(1, Ordering::SeqCst);
        if chain_id == FLOW_MAINNET && !self.knows_required.load(Ordering::SeqCst) {
            return Err(ProviderError::unrecognized_chain(chain_id));
        }
        self.chain.store(chain_id, Ordering::SeqCst);
        Ok(())
    }

    async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), ProviderError> {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        if network.chain_id.0 == FLOW_MAINNET {
            self.knows_required.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ProviderError> {
        if self.reject_transactions.load(Ordering::SeqCst) {
            return Err(ProviderError::user_rejected());
        }
        self.submissions.lock().unwrap().push(tx);
        Ok(*self.tx_hash.lock().unwrap())
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

/// Node serving the randomness contract's read functions and scripted receipts.
pub struct MockChain {
    chain_id: u64,
    head: AtomicU64,
    /// Receipts become visible after this many polls.
    pending_polls: u32,
    receipts: Mutex<HashMap<TxHash, ConfirmedReceipt>>,
    generations: Mutex<HashMap<B256, RandomGeneration>>,
    /// Overrides the simulated contract's number.
    fixed_number: Mutex<Option<u64>>,
    pub calls: AtomicU32,
    pub receipt_polls: AtomicU32,
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Self::with_pending_polls(0)
    }

    pub fn with_pending_polls(pending_polls: u32) -> Arc<Self> {
        Arc::new(Self {
            chain_id: FLOW_MAINNET,
            head: AtomicU64::new(1000),
            pending_polls,
            receipts: Mutex::new(HashMap::new()),
            generations: Mutex::new(HashMap::new()),
            fixed_number: Mutex::new(None),
            calls: AtomicU32::new(0),
            receipt_polls: AtomicU32::new(0),
        })
    }

    pub fn add_receipt(&self, receipt: ConfirmedReceipt) {
        self.receipts
            .lock()
            .unwrap()
            .insert(receipt.transaction_hash, receipt);
    }

    pub fn store_generation(&self, id: B256, generation: RandomGeneration) {
        self.generations.lock().unwrap().insert(id, generation);
    }

    pub fn fix_number(&self, value: u64) {
        *self.fixed_number.lock().unwrap() = Some(value);
    }

    fn revert(message: &str, data: Option<Vec<u8>>) -> RpcError {
        RpcError::Reverted {
            message: message.to_string(),
            data: data.map(Bytes::from),
        }
    }
}

#[async_trait]
impl ChainRpc for MockChain {
    async fn chain_id(&self) -> RpcResult<ChainId> {
        Ok(ChainId(self.chain_id))
    }

    async fn block_number(&self) -> RpcResult<u64> {
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn call(&self, _to: Address, input: Bytes) -> RpcResult<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let selector = input.get(..4).unwrap_or_default();

        if selector == getRandomNumberCall::SELECTOR {
            let call = getRandomNumberCall::abi_decode(&input).map_err(|e| RpcError::Decode(e.to_string()))?;
            let fixed = *self.fixed_number.lock().unwrap();
            let value = fixed.unwrap_or_else(|| rand::thread_rng().gen_range(call.min..=call.max));
            return Ok(value.abi_encode().into());
        }

        if selector == selectRandomItemCall::SELECTOR {
            let call = selectRandomItemCall::abi_decode(&input).map_err(|e| RpcError::Decode(e.to_string()))?;
            if call.items.is_empty() {
                return Err(Self::revert("execution reverted", Some(EmptyItemArray {}.abi_encode())));
            }
            let index = rand::thread_rng().gen_range(0..call.items.len());
            return Ok(call.items[index].clone().abi_encode().into());
        }

        if selector == getGenerationDetailsCall::SELECTOR {
            let call =
                getGenerationDetailsCall::abi_decode(&input).map_err(|e| RpcError::Decode(e.to_string()))?;
            let stored = self.generations.lock().unwrap().get(&call.generationId).cloned();
            let generation = stored.unwrap_or(RandomGeneration {
                result: 0,
                min: 0,
                max: 0,
                requester: Address::ZERO,
                timestamp: U256::ZERO,
                blockNumber: U256::ZERO,
            });
            return Ok(generation.abi_encode().into());
        }

        Err(Self::revert("unknown selector", None))
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> RpcResult<Option<ConfirmedReceipt>> {
        let n = self.receipt_polls.fetch_add(1, Ordering::SeqCst);
        if n < self.pending_polls {
            return Ok(None);
        }
        Ok(self.receipts.lock().unwrap().get(&tx_hash).cloned())
    }
}

/// Hands out a shared [`MockChain`] and counts connections.
pub struct MockConnector {
    chain: Arc<MockChain>,
    pub connects: AtomicU32,
}

impl MockConnector {
    pub fn new(chain: Arc<MockChain>) -> Arc<Self> {
        Arc::new(Self {
            chain,
            connects: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl RpcConnector for MockConnector {
    async fn connect(&self, _network: &NetworkDescriptor) -> RpcResult<Arc<dyn ChainRpc>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.chain.clone())
    }
}

/// Default configuration with a fast confirmation schedule.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.confirmation.timeout_secs = 1;
    config.confirmation.poll_base_ms = 1;
    config.confirmation.poll_max_ms = 5;
    config
}

pub fn service(wallet: Option<Arc<MockWallet>>, chain: Arc<MockChain>) -> RandomnessService {
    let provider = wallet.map(|w| w as Arc<dyn WalletProvider>);
    RandomnessService::with_connector(&test_config(), provider, MockConnector::new(chain)).unwrap()
}

/// Log of a verifiable number generation emitted by the contract.
pub fn number_event(request_id: B256, value: u64, min: u64, max: u64, block: u64) -> Log {
    let event = VerifiableRandomNumberGenerated {
        generationId: request_id,
        requester: ACCOUNT,
        randomNumber: value,
        min,
        max,
        blockNumber: U256::from(block),
        timestamp: U256::from(1_700_000_000u64),
    };
    Log {
        address: contract_address(),
        data: event.encode_log_data(),
    }
}

/// Log of a verifiable item selection emitted by the contract.
pub fn selection_event(request_id: B256, items: &[&str], index: usize, block: u64) -> Log {
    let event = VerifiableRandomItemSelected {
        selectionId: request_id,
        requester: ACCOUNT,
        selectedItem: items[index].to_string(),
        items: items.iter().map(|s| s.to_string()).collect(),
        index: U256::from(index),
        blockNumber: U256::from(block),
        timestamp: U256::from(1_700_000_000u64),
    };
    Log {
        address: contract_address(),
        data: event.encode_log_data(),
    }
}

/// A log from some other contract in the same transaction.
pub fn unrelated_log() -> Log {
    let event = VerifiableRandomNumberGenerated {
        generationId: B256::repeat_byte(0xee),
        requester: Address::repeat_byte(0x99),
        randomNumber: 7,
        min: 0,
        max: 10,
        blockNumber: U256::from(1000),
        timestamp: U256::ZERO,
    };
    Log {
        address: Address::repeat_byte(0x99),
        data: event.encode_log_data(),
    }
}

pub fn receipt(tx_hash: TxHash, block: u64, success: bool, logs: Vec<Log>) -> ConfirmedReceipt {
    ConfirmedReceipt {
        transaction_hash: tx_hash,
        block_number: block,
        success,
        logs,
    }
}

/// Poll `condition` until it holds or a second passes.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
