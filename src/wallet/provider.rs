//! Wallet provider boundary (EIP-1193 shaped).
//!
//! The wallet is an external collaborator: it owns keys, shows prompts and
//! may reject anything. This module only describes what the client needs
//! from it.

use alloy::primitives::{Address, TxHash};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::network::NetworkDescriptor;

/// Error returned by a wallet provider, carrying an EIP-1193 code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("wallet provider error {code}: {message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    /// The user rejected the request.
    pub const USER_REJECTED: i64 = 4001;
    /// The requested account or method is not authorized.
    pub const UNAUTHORIZED: i64 = 4100;
    /// The provider does not support the method.
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    /// The provider is disconnected from all chains.
    pub const DISCONNECTED: i64 = 4900;
    /// The provider is disconnected from the requested chain.
    pub const CHAIN_DISCONNECTED: i64 = 4901;
    /// The chain has not been added to the wallet.
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    /// Internal JSON-RPC error.
    pub const INTERNAL: i64 = -32603;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(Self::USER_REJECTED, "User rejected the request.")
    }

    pub fn unrecognized_chain(chain_id: u64) -> Self {
        Self::new(
            Self::UNRECOGNIZED_CHAIN,
            format!("Unrecognized chain ID {:#x}. Try adding the chain first.", chain_id),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Self::INTERNAL, message)
    }

    pub fn is_user_rejected(&self) -> bool {
        self.code == Self::USER_REJECTED
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == Self::UNRECOGNIZED_CHAIN
    }

    /// Provider unusable rather than refusing this one request.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self.code,
            Self::UNAUTHORIZED | Self::UNSUPPORTED_METHOD | Self::DISCONNECTED | Self::CHAIN_DISCONNECTED
        )
    }
}

/// Notifications pushed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// Authorized accounts changed; empty means access was revoked.
    AccountsChanged(Vec<Address>),
    /// The active chain changed.
    ChainChanged(u64),
    /// The provider lost its connection.
    Disconnected,
}

/// An injected wallet.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// `eth_requestAccounts`: may prompt the user.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// `eth_chainId`.
    async fn chain_id(&self) -> Result<u64, ProviderError>;

    /// `wallet_switchEthereumChain`.
    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError>;

    /// `wallet_addEthereumChain`.
    async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), ProviderError>;

    /// `eth_sendTransaction`: the wallet signs and broadcasts.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ProviderError>;

    /// Subscribe to provider notifications. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}
