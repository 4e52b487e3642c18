//! Read-only client for instant randomness.
//!
//! The connection is opened on first use and kept for the life of the
//! client. Concurrent first callers share one in-flight initialization; a
//! failed initialization is retried by the next caller.

use alloy::primitives::Address;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::blockchain::client::{ChainRpc, RpcClient};
use crate::blockchain::types::{RpcError, RpcResult};
use crate::contract::binding::{revert_reason, RandomnessContract};
use crate::error::{RandomnessError, Result};
use crate::network::NetworkDescriptor;
use crate::randomness::types::{Mode, RandomnessOutcome, RandomnessRequest, RandomnessResult, RequestKind};

/// Opens read connections to a network.
#[async_trait]
pub trait RpcConnector: Send + Sync {
    async fn connect(&self, network: &NetworkDescriptor) -> RpcResult<Arc<dyn ChainRpc>>;
}

/// Connects over HTTP JSON-RPC and checks the endpoint's chain ID.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    failover_urls: Vec<String>,
    timeout: Duration,
}

impl HttpConnector {
    pub fn new(failover_urls: Vec<String>, timeout: Duration) -> Self {
        Self { failover_urls, timeout }
    }
}

#[async_trait]
impl RpcConnector for HttpConnector {
    async fn connect(&self, network: &NetworkDescriptor) -> RpcResult<Arc<dyn ChainRpc>> {
        let client = RpcClient::new(&network.rpc_url, &self.failover_urls, self.timeout)?;
        client.verify_chain_id(network.chain_id).await?;
        Ok(Arc::new(client))
    }
}

/// Lazily connected, process-lifetime read client.
pub struct ReadOnlyClient {
    network: NetworkDescriptor,
    contract: RandomnessContract,
    connector: Arc<dyn RpcConnector>,
    connection: OnceCell<Arc<dyn ChainRpc>>,
}

impl ReadOnlyClient {
    pub fn new(network: NetworkDescriptor, contract: Address, connector: Arc<dyn RpcConnector>) -> Self {
        Self {
            network,
            contract: RandomnessContract::new(contract),
            connector,
            connection: OnceCell::new(),
        }
    }

    pub fn contract(&self) -> RandomnessContract {
        self.contract
    }

    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    /// The shared read connection, opening it if needed.
    pub async fn connection(&self) -> Result<Arc<dyn ChainRpc>> {
        self.connection
            .get_or_try_init(|| async {
                tracing::info!(
                    rpc_url = %self.network.rpc_url,
                    chain_id = %self.network.chain_id,
                    "Opening read-only connection"
                );
                self.connector.connect(&self.network).await.map_err(|e| {
                    tracing::warn!(error = %e, "Read-only connection failed");
                    RandomnessError::NetworkUnavailable(e.to_string())
                })
            })
            .await
            .cloned()
    }

    /// Answer an instant request with a direct contract read.
    pub async fn query(&self, request: &RandomnessRequest) -> Result<RandomnessResult> {
        if request.mode != Mode::Instant {
            return Err(RandomnessError::InvalidArgument(
                "read-only client only serves instant requests".to_string(),
            ));
        }
        request.validate()?;
        let rpc = self.connection().await?;

        let outcome = match &request.kind {
            RequestKind::Number { min, max } => {
                let value = self
                    .contract
                    .get_random_number(rpc.as_ref(), *min, *max)
                    .await
                    .map_err(classify_call_error)?;
                if value < *min || value > *max {
                    return Err(RandomnessError::ContractCallFailed(format!(
                        "random number {} outside [{}, {}]",
                        value, min, max
                    )));
                }
                RandomnessOutcome::Number { value }
            }
            RequestKind::Selection { items } => {
                let item = self
                    .contract
                    .select_random_item(rpc.as_ref(), items)
                    .await
                    .map_err(classify_call_error)?;
                let index = items.iter().position(|i| *i == item).ok_or_else(|| {
                    RandomnessError::ContractCallFailed(format!("selected item '{}' not in request", item))
                })?;
                RandomnessOutcome::Selection {
                    item,
                    index: index as u64,
                }
            }
            RequestKind::Decision => {
                return Err(RandomnessError::InvalidArgument(
                    "decisions are only available in verifiable mode".to_string(),
                ))
            }
        };

        tracing::debug!(kind = request.kind.as_str(), "Instant randomness served");
        Ok(RandomnessResult::instant(outcome))
    }
}

/// Classify a failed read call.
pub(crate) fn classify_call_error(e: RpcError) -> RandomnessError {
    match e {
        e if e.is_unavailable() => RandomnessError::NetworkUnavailable(e.to_string()),
        RpcError::Reverted { message, data } => {
            RandomnessError::ContractCallFailed(revert_reason(&message, data.as_ref()))
        }
        other => RandomnessError::ContractCallFailed(other.to_string()),
    }
}
