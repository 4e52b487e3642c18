//! Static description of the networks this client can run against.
//!
//! Exactly one descriptor is the required network for a deployment; the
//! rest only exist so a wallet can be told how to register them.

use alloy::primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};

use crate::blockchain::types::ChainId;
use crate::config::schema::NetworkConfig;

/// Flow EVM mainnet chain ID.
pub const FLOW_MAINNET_CHAIN_ID: u64 = 747;

/// Flow EVM testnet chain ID.
pub const FLOW_TESTNET_CHAIN_ID: u64 = 545;

/// Immutable description of an EVM network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    pub chain_id: ChainId,
    pub display_name: String,
    pub currency_name: String,
    pub currency_symbol: String,
    pub currency_decimals: u8,
    pub rpc_url: String,
    pub block_explorer_url: String,
}

impl NetworkDescriptor {
    /// Flow EVM mainnet, the production deployment.
    pub fn flow_mainnet() -> Self {
        Self {
            chain_id: ChainId(FLOW_MAINNET_CHAIN_ID),
            display_name: "Flow EVM".to_string(),
            currency_name: "Flow Token".to_string(),
            currency_symbol: "FLOW".to_string(),
            currency_decimals: 18,
            rpc_url: "https://mainnet.evm.nodes.onflow.org".to_string(),
            block_explorer_url: "https://evm.flowscan.io".to_string(),
        }
    }

    /// Flow EVM testnet.
    pub fn flow_testnet() -> Self {
        Self {
            chain_id: ChainId(FLOW_TESTNET_CHAIN_ID),
            display_name: "Flow Testnet".to_string(),
            currency_name: "Flow Token".to_string(),
            currency_symbol: "FLOW".to_string(),
            currency_decimals: 18,
            rpc_url: "https://testnet.evm.nodes.onflow.org".to_string(),
            block_explorer_url: "https://evm-testnet.flowscan.io".to_string(),
        }
    }

    /// Look up a built-in descriptor by chain ID.
    pub fn known(chain_id: ChainId) -> Option<Self> {
        match chain_id.0 {
            FLOW_MAINNET_CHAIN_ID => Some(Self::flow_mainnet()),
            FLOW_TESTNET_CHAIN_ID => Some(Self::flow_testnet()),
            _ => None,
        }
    }

    /// Explorer page for a transaction.
    pub fn transaction_url(&self, tx_hash: &TxHash) -> String {
        format!("{}/tx/{}", self.block_explorer_url.trim_end_matches('/'), tx_hash)
    }

    /// Explorer page for an account or contract.
    pub fn address_url(&self, address: &Address) -> String {
        format!(
            "{}/address/{}",
            self.block_explorer_url.trim_end_matches('/'),
            address
        )
    }

    /// Parameters of a `wallet_addEthereumChain` request (EIP-3085).
    pub fn add_chain_params(&self) -> serde_json::Value {
        serde_json::json!({
            "chainId": self.chain_id.to_hex(),
            "chainName": self.display_name,
            "nativeCurrency": {
                "name": self.currency_name,
                "symbol": self.currency_symbol,
                "decimals": self.currency_decimals,
            },
            "rpcUrls": [self.rpc_url],
            "blockExplorerUrls": [self.block_explorer_url],
        })
    }
}

impl From<&NetworkConfig> for NetworkDescriptor {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            chain_id: ChainId(config.chain_id),
            display_name: config.display_name.clone(),
            currency_name: config.currency_name.clone(),
            currency_symbol: config.currency_symbol.clone(),
            currency_decimals: config.currency_decimals,
            rpc_url: config.rpc_url.clone(),
            block_explorer_url: config.explorer_url.clone(),
        }
    }
}

/// Registry holding the one network this deployment requires.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    required: NetworkDescriptor,
}

impl ChainRegistry {
    pub fn new(required: NetworkDescriptor) -> Self {
        Self { required }
    }

    pub fn from_config(config: &NetworkConfig) -> Self {
        Self::new(NetworkDescriptor::from(config))
    }

    /// The network every session and read must be on.
    pub fn required_network(&self) -> &NetworkDescriptor {
        &self.required
    }

    /// Whether the given chain is the required one.
    pub fn is_required(&self, chain_id: ChainId) -> bool {
        self.required.chain_id == chain_id
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new(NetworkDescriptor::flow_mainnet())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_is_flow_mainnet() {
        let registry = ChainRegistry::default();
        assert_eq!(registry.required_network().chain_id, ChainId(747));
        assert!(registry.is_required(ChainId(747)));
        assert!(!registry.is_required(ChainId(545)));
    }

    #[test]
    fn test_known_networks() {
        assert_eq!(
            NetworkDescriptor::known(ChainId(545)).map(|n| n.display_name),
            Some("Flow Testnet".to_string())
        );
        assert!(NetworkDescriptor::known(ChainId(1)).is_none());
    }

    #[test]
    fn test_add_chain_params() {
        let params = NetworkDescriptor::flow_testnet().add_chain_params();
        assert_eq!(params["chainId"], "0x221");
        assert_eq!(params["nativeCurrency"]["decimals"], 18);
        assert_eq!(params["rpcUrls"][0], "https://testnet.evm.nodes.onflow.org");
    }

    #[test]
    fn test_explorer_links() {
        let network = NetworkDescriptor::flow_mainnet();
        let url = network.transaction_url(&TxHash::ZERO);
        assert!(url.starts_with("https://evm.flowscan.io/tx/0x0000"));
        let url = network.address_url(&Address::ZERO);
        assert_eq!(
            url,
            "https://evm.flowscan.io/address/0x0000000000000000000000000000000000000000"
        );
    }
}
