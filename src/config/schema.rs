//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every section has defaults describing the production deployment, so an
//! empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the randomness client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// The required network.
    pub network: NetworkConfig,

    /// Randomness contract location.
    pub contract: ContractConfig,

    /// Read-only RPC settings.
    pub rpc: RpcConfig,

    /// Transaction confirmation policy.
    pub confirmation: ConfirmationConfig,

    /// Headless wallet settings.
    pub wallet: WalletConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Description of the required network.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Chain ID (747 for Flow EVM mainnet, 545 for testnet).
    pub chain_id: u64,

    /// Human-readable network name.
    pub display_name: String,

    /// Native currency name.
    pub currency_name: String,

    /// Native currency ticker.
    pub currency_symbol: String,

    /// Native currency decimals.
    pub currency_decimals: u8,

    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Block explorer base URL.
    pub explorer_url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: 747,
            display_name: "Flow EVM".to_string(),
            currency_name: "Flow Token".to_string(),
            currency_symbol: "FLOW".to_string(),
            currency_decimals: 18,
            rpc_url: "https://mainnet.evm.nodes.onflow.org".to_string(),
            failover_urls: Vec::new(),
            explorer_url: "https://evm.flowscan.io".to_string(),
        }
    }
}

/// Randomness contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Deployed contract address.
    pub address: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            address: "0x26E9f28c7c3eB5425003959AC4F4279eF373A1c2".to_string(),
        }
    }
}

/// Read-only RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// RPC request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

/// Confirmation wait policy for verifiable requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Maximum time to wait for a receipt, in seconds.
    pub timeout_secs: u64,

    /// Block depth required, counting the inclusion block.
    pub confirmation_blocks: u32,

    /// First receipt poll delay in milliseconds.
    pub poll_base_ms: u64,

    /// Upper bound on the receipt poll delay in milliseconds.
    pub poll_max_ms: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            confirmation_blocks: 1,
            poll_base_ms: 500,
            poll_max_ms: 4000,
        }
    }
}

/// Headless wallet configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Environment variable holding the hex private key.
    pub private_key_env: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key_env: "RANDOMNESS_WALLET_PRIVATE_KEY".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Prometheus exporter bind address; disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_address: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_target_flow_mainnet() {
        let config = AppConfig::default();
        assert_eq!(config.network.chain_id, 747);
        assert_eq!(config.confirmation.timeout_secs, 120);
        assert_eq!(config.rpc.timeout_secs, 10);
        assert!(config.observability.metrics_address.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [network]
            chain_id = 545
            rpc_url = "https://testnet.evm.nodes.onflow.org"

            [confirmation]
            timeout_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.network.chain_id, 545);
        assert_eq!(config.network.currency_symbol, "FLOW");
        assert_eq!(config.confirmation.timeout_secs, 30);
        assert_eq!(config.confirmation.poll_max_ms, 4000);
    }
}
