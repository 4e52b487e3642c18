//! Read-only JSON-RPC client with timeout and failover.
//!
//! # Responsibilities
//! - Connect to the network's JSON-RPC endpoint (plus failovers)
//! - Execute `eth_call` against the randomness contract
//! - Fetch receipts and block height for confirmation tracking
//! - Verify the endpoint serves the required chain

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::transports::TransportError;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{ChainId, ConfirmedReceipt, RpcError, RpcResult};

/// The chain operations the client needs from a node.
///
/// Implemented over HTTP by [`RpcClient`]; tests substitute scripted nodes.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Chain ID served by the endpoint.
    async fn chain_id(&self) -> RpcResult<ChainId>;

    /// Latest block number.
    async fn block_number(&self) -> RpcResult<u64>;

    /// Execute a read-only call and return the raw output.
    async fn call(&self, to: Address, input: Bytes) -> RpcResult<Bytes>;

    /// Receipt of a mined transaction, or `None` while pending.
    async fn transaction_receipt(&self, tx_hash: TxHash) -> RpcResult<Option<ConfirmedReceipt>>;
}

/// HTTP JSON-RPC client with failover support.
#[derive(Clone)]
pub struct RpcClient {
    /// List of providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Primary endpoint, kept for diagnostics.
    rpc_url: String,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl RpcClient {
    /// Create a client over a primary endpoint and optional failovers.
    ///
    /// No request is made; invalid failover URLs are skipped.
    pub fn new(rpc_url: &str, failover_urls: &[String], timeout_duration: Duration) -> RpcResult<Self> {
        let primary: url::Url = rpc_url
            .parse()
            .map_err(|e| RpcError::Transport(format!("Invalid RPC URL '{}': {}", rpc_url, e)))?;

        let mut providers = vec![
            Arc::new(ProviderBuilder::new().connect_http(primary)) as Arc<dyn Provider + Send + Sync>,
        ];
        for url_str in failover_urls {
            match url_str.parse::<url::Url>() {
                Ok(url) => providers.push(
                    Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>,
                ),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        Ok(Self {
            providers,
            rpc_url: rpc_url.to_string(),
            timeout_duration,
        })
    }

    /// Verify the endpoint serves the expected chain.
    pub async fn verify_chain_id(&self, expected: ChainId) -> RpcResult<()> {
        let actual = self.chain_id().await?;
        if actual != expected {
            return Err(RpcError::ChainMismatch {
                expected: expected.0,
                actual: actual.0,
            });
        }
        Ok(())
    }

    /// Run `op` against each provider in turn until one answers.
    ///
    /// Node-level errors (reverts) are returned immediately; only
    /// transport failures and timeouts move on to the next provider.
    async fn with_failover<T, F, Fut>(&self, op: &'static str, f: F) -> RpcResult<T>
    where
        F: Fn(Arc<dyn Provider + Send + Sync>) -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let mut timed_out = false;
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, f(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    let err = classify_transport_error(e);
                    if !err.is_unavailable() {
                        return Err(err);
                    }
                    tracing::warn!(provider_idx = i, op, error = %err, "RPC error, trying next provider");
                }
                Err(_) => {
                    timed_out = true;
                    tracing::warn!(provider_idx = i, op, "RPC timeout, trying next provider");
                }
            }
        }

        if timed_out && self.providers.len() == 1 {
            return Err(RpcError::Timeout(self.timeout_duration.as_secs()));
        }
        Err(RpcError::Transport(format!("All RPC providers failed ({})", op)))
    }
}

#[async_trait]
impl ChainRpc for RpcClient {
    async fn chain_id(&self) -> RpcResult<ChainId> {
        self.with_failover("eth_chainId", |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    async fn block_number(&self) -> RpcResult<u64> {
        self.with_failover("eth_blockNumber", |p| async move { p.get_block_number().await })
            .await
    }

    async fn call(&self, to: Address, input: Bytes) -> RpcResult<Bytes> {
        let request = TransactionRequest::default().with_to(to).with_input(input);
        self.with_failover("eth_call", |p| {
            let request = request.clone();
            async move { p.call(request).await }
        })
        .await
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> RpcResult<Option<ConfirmedReceipt>> {
        let receipt = self
            .with_failover("eth_getTransactionReceipt", |p| async move {
                p.get_transaction_receipt(tx_hash).await
            })
            .await?;
        Ok(receipt.and_then(into_confirmed))
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("rpc_url", &self.rpc_url)
            .field("providers", &self.providers.len())
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}

/// Split node-reported errors from transport failures.
fn classify_transport_error(err: TransportError) -> RpcError {
    if let Some(payload) = err.as_error_resp() {
        return RpcError::Reverted {
            message: payload.message.to_string(),
            data: payload.as_revert_data(),
        };
    }
    RpcError::Transport(err.to_string())
}

/// Receipts without a block number are still pending.
fn into_confirmed(receipt: TransactionReceipt) -> Option<ConfirmedReceipt> {
    let block_number = receipt.block_number?;
    Some(ConfirmedReceipt {
        transaction_hash: receipt.transaction_hash,
        block_number,
        success: receipt.status(),
        logs: receipt
            .inner
            .logs()
            .iter()
            .map(|log| log.inner.clone())
            .collect(),
    })
}
