//! Wallet provider backed by a local private key.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized
//!
//! Behaves like an injected wallet that never prompts: accounts are always
//! authorized, unknown chains are refused with 4902 until registered.

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::timeout;

use crate::network::NetworkDescriptor;
use crate::wallet::provider::{ProviderError, ProviderEvent, WalletProvider};

/// Default environment variable holding the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "RANDOMNESS_WALLET_PRIVATE_KEY";

/// Key-holding wallet that signs and broadcasts through the active network's RPC.
#[derive(Debug)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
    /// Networks the wallet can switch to, keyed by chain ID.
    networks: DashMap<u64, NetworkDescriptor>,
    active_chain: AtomicU64,
    events: broadcast::Sender<ProviderEvent>,
    send_timeout: Duration,
}

impl LocalWallet {
    /// Create a wallet from a hex-encoded private key, starting on `network`.
    ///
    /// The key may carry a `0x` prefix.
    pub fn from_private_key(private_key_hex: &str, network: NetworkDescriptor) -> Result<Self, ProviderError> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| ProviderError::internal(format!("Invalid private key format: {}", e)))?;

        tracing::info!(
            address = %signer.address(),
            chain_id = %network.chain_id,
            "Local wallet initialized"
        );

        let active_chain = AtomicU64::new(network.chain_id.0);
        let networks = DashMap::new();
        networks.insert(network.chain_id.0, network);

        Ok(Self {
            signer,
            networks,
            active_chain,
            events: broadcast::channel(16).0,
            send_timeout: Duration::from_secs(30),
        })
    }

    /// Load the key from `var`.
    ///
    /// Returns `Ok(None)` when the variable is unset.
    pub fn from_env(var: &str, network: NetworkDescriptor) -> Result<Option<Self>, ProviderError> {
        match std::env::var(var) {
            Ok(key) => Self::from_private_key(key.trim(), network).map(Some),
            Err(_) => {
                tracing::debug!(var, "No wallet key in environment");
                Ok(None)
            }
        }
    }

    /// Set the broadcast timeout.
    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Whether `chain_id` has been registered.
    pub fn knows_chain(&self, chain_id: u64) -> bool {
        self.networks.contains_key(&chain_id)
    }

    fn active_network(&self) -> Result<NetworkDescriptor, ProviderError> {
        let chain_id = self.active_chain.load(Ordering::SeqCst);
        self.networks
            .get(&chain_id)
            .map(|n| n.value().clone())
            .ok_or_else(|| ProviderError::new(ProviderError::CHAIN_DISCONNECTED, "Active chain not configured"))
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        Ok(vec![self.signer.address()])
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        Ok(self.active_chain.load(Ordering::SeqCst))
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        if !self.networks.contains_key(&chain_id) {
            return Err(ProviderError::unrecognized_chain(chain_id));
        }
        let previous = self.active_chain.swap(chain_id, Ordering::SeqCst);
        if previous != chain_id {
            tracing::info!(from = previous, to = chain_id, "Local wallet switched chain");
            let _ = self.events.send(ProviderEvent::ChainChanged(chain_id));
        }
        Ok(())
    }

    async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), ProviderError> {
        network
            .rpc_url
            .parse::<url::Url>()
            .map_err(|e| ProviderError::internal(format!("Invalid RPC URL '{}': {}", network.rpc_url, e)))?;
        tracing::info!(chain_id = %network.chain_id, name = %network.display_name, "Network registered");
        self.networks.insert(network.chain_id.0, network.clone());
        Ok(())
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ProviderError> {
        let network = self.active_network()?;
        let url: url::Url = network
            .rpc_url
            .parse()
            .map_err(|e| ProviderError::internal(format!("Invalid RPC URL '{}': {}", network.rpc_url, e)))?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(self.signer.clone()))
            .connect_http(url);

        let pending = timeout(self.send_timeout, provider.send_transaction(tx))
            .await
            .map_err(|_| ProviderError::new(ProviderError::DISCONNECTED, "Broadcast timed out"))?
            .map_err(|e| match e.as_error_resp() {
                Some(payload) => ProviderError::new(payload.code, payload.message.to_string()),
                None => ProviderError::new(ProviderError::DISCONNECTED, e.to_string()),
            })?;

        let tx_hash = *pending.tx_hash();
        tracing::info!(tx_hash = %tx_hash, chain_id = %network.chain_id, "Transaction broadcast");
        Ok(tx_hash)
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_wallet_from_private_key() {
        let wallet = LocalWallet::from_private_key(TEST_PRIVATE_KEY, NetworkDescriptor::flow_mainnet()).unwrap();
        assert_eq!(
            wallet.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_wallet_with_0x_prefix() {
        let wallet = LocalWallet::from_private_key(
            &format!("0x{}", TEST_PRIVATE_KEY),
            NetworkDescriptor::flow_mainnet(),
        )
        .unwrap();
        assert_eq!(
            wallet.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_invalid_private_key() {
        let result = LocalWallet::from_private_key("invalid_key", NetworkDescriptor::flow_mainnet());
        assert!(result.unwrap_err().message.contains("Invalid private key"));
    }

    #[test]
    fn test_from_env_unset() {
        let wallet = LocalWallet::from_env("RANDOMNESS_TEST_UNSET_KEY", NetworkDescriptor::flow_mainnet()).unwrap();
        assert!(wallet.is_none());
    }

    #[tokio::test]
    async fn test_unknown_chain_requires_registration() {
        let wallet = LocalWallet::from_private_key(TEST_PRIVATE_KEY, NetworkDescriptor::flow_testnet()).unwrap();
        let mut events = wallet.subscribe();

        let err = wallet.switch_chain(747).await.unwrap_err();
        assert!(err.is_unrecognized_chain());
        assert_eq!(wallet.chain_id().await.unwrap(), 545);

        wallet.add_chain(&NetworkDescriptor::flow_mainnet()).await.unwrap();
        assert!(wallet.knows_chain(747));
        wallet.switch_chain(747).await.unwrap();

        assert_eq!(wallet.chain_id().await.unwrap(), 747);
        assert_eq!(events.recv().await.unwrap(), ProviderEvent::ChainChanged(747));
    }

    #[tokio::test]
    async fn test_accounts_always_authorized() {
        let wallet = LocalWallet::from_private_key(TEST_PRIVATE_KEY, NetworkDescriptor::flow_mainnet()).unwrap();
        assert_eq!(wallet.request_accounts().await.unwrap(), vec![wallet.address()]);
    }
}
