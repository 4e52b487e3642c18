//! Transaction confirmation monitoring.
//!
//! # Responsibilities
//! - Poll the read endpoint for a submitted transaction's receipt
//! - Track confirmation depth
//! - Bound the wait with a deadline and a caller cancellation token

use alloy::primitives::TxHash;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::blockchain::client::ChainRpc;
use crate::blockchain::types::{ConfirmationStatus, ConfirmedReceipt, RpcResult};
use crate::config::schema::ConfirmationConfig;
use crate::error::{RandomnessError, Result};
use crate::lifecycle::CancelToken;
use crate::observability::metrics;
use crate::resilience::backoff::poll_delay;

/// How long and how deep to wait for a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    /// Overall deadline for the wait.
    pub timeout: Duration,
    /// Block depth required, counting the inclusion block.
    pub confirmation_blocks: u32,
    /// First poll delay.
    pub poll_base: Duration,
    /// Poll delay ceiling.
    pub poll_max: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self::from(&ConfirmationConfig::default())
    }
}

impl From<&ConfirmationConfig> for ConfirmationPolicy {
    fn from(config: &ConfirmationConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            confirmation_blocks: config.confirmation_blocks.max(1),
            poll_base: Duration::from_millis(config.poll_base_ms),
            poll_max: Duration::from_millis(config.poll_max_ms),
        }
    }
}

/// Waits for submitted transactions to be mined.
#[derive(Clone)]
pub struct ConfirmationWatcher {
    rpc: Arc<dyn ChainRpc>,
    policy: ConfirmationPolicy,
}

impl ConfirmationWatcher {
    pub fn new(rpc: Arc<dyn ChainRpc>, policy: ConfirmationPolicy) -> Self {
        Self { rpc, policy }
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    /// Poll once.
    ///
    /// A reverted receipt is reported as confirmed right away; depth only
    /// matters for successful transactions.
    pub async fn check(&self, tx_hash: TxHash) -> RpcResult<ConfirmationStatus> {
        let receipt = match self.rpc.transaction_receipt(tx_hash).await? {
            Some(r) => r,
            None => return Ok(ConfirmationStatus::Pending),
        };

        let required = self.policy.confirmation_blocks;
        if !receipt.success || required <= 1 {
            return Ok(ConfirmationStatus::Confirmed(receipt));
        }

        let current_block = self.rpc.block_number().await?;
        let depth = current_block.saturating_sub(receipt.block_number) + 1;
        let depth = u32::try_from(depth).unwrap_or(u32::MAX);
        if depth >= required {
            Ok(ConfirmationStatus::Confirmed(receipt))
        } else {
            Ok(ConfirmationStatus::Confirming {
                current: depth,
                required,
            })
        }
    }

    /// Wait until the transaction is confirmed, reverted, timed out or cancelled.
    pub async fn wait(&self, tx_hash: TxHash, cancel: &CancelToken) -> Result<ConfirmedReceipt> {
        let poll = async {
            let mut attempt = 0u32;
            loop {
                metrics::record_confirmation_poll();
                match self.check(tx_hash).await {
                    Ok(ConfirmationStatus::Confirmed(receipt)) => return receipt,
                    Ok(ConfirmationStatus::Pending) => {
                        tracing::debug!(tx_hash = %tx_hash, attempt, "Transaction pending");
                    }
                    Ok(ConfirmationStatus::Confirming { current, required }) => {
                        tracing::debug!(
                            tx_hash = %tx_hash,
                            confirmations = current,
                            required,
                            "Waiting for confirmations"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt poll failed");
                    }
                }
                sleep(poll_delay(attempt, self.policy.poll_base, self.policy.poll_max)).await;
                attempt = attempt.saturating_add(1);
            }
        };

        let receipt = tokio::select! {
            result = timeout(self.policy.timeout, poll) => match result {
                Ok(receipt) => receipt,
                Err(_) => {
                    tracing::warn!(tx_hash = %tx_hash, timeout_secs = self.policy.timeout.as_secs(), "Confirmation timed out");
                    return Err(RandomnessError::ConfirmationTimeout {
                        tx_hash,
                        timeout_secs: self.policy.timeout.as_secs(),
                    });
                }
            },
            _ = cancel.cancelled() => {
                tracing::info!(tx_hash = %tx_hash, "Confirmation wait cancelled");
                return Err(RandomnessError::Cancelled);
            }
        };

        if !receipt.success {
            return Err(RandomnessError::TransactionFailed {
                tx_hash,
                reason: "transaction reverted".to_string(),
            });
        }

        tracing::info!(
            tx_hash = %tx_hash,
            block_number = receipt.block_number,
            logs = receipt.logs.len(),
            "Transaction confirmed"
        );
        Ok(receipt)
    }
}
