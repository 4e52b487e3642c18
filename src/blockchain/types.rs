//! Chain-level types and RPC error definitions.

use alloy::primitives::{Bytes, Log, TxHash};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Hex quantity form used by wallet RPC methods (e.g. `0x2eb`).
    pub fn to_hex(self) -> String {
        format!("{:#x}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur talking to a JSON-RPC endpoint.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Endpoint unreachable or transport failure.
    #[error("RPC error: {0}")]
    Transport(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The node rejected the call (revert or execution error).
    #[error("Execution reverted: {message}")]
    Reverted {
        message: String,
        data: Option<Bytes>,
    },

    /// Call output did not match the expected ABI.
    #[error("ABI decode error: {0}")]
    Decode(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

impl RpcError {
    /// True when the endpoint itself could not be used.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            RpcError::Transport(_) | RpcError::Timeout(_) | RpcError::ChainMismatch { .. }
        )
    }
}

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// A mined transaction's receipt, reduced to what the client needs.
///
/// Logs keep the order returned by the node, which is their execution
/// order within the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedReceipt {
    pub transaction_hash: TxHash,
    pub block_number: u64,
    /// Execution status; false means the transaction reverted.
    pub success: bool,
    pub logs: Vec<Log>,
}

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Transaction is pending in mempool.
    Pending,
    /// Transaction has been mined but not enough confirmations.
    Confirming { current: u32, required: u32 },
    /// Transaction is confirmed with required block depth.
    Confirmed(ConfirmedReceipt),
}
