//! Error taxonomy surfaced by the produced interface.
//!
//! Lower layers keep their own error types (`RpcError`, `ProviderError`);
//! callers classify them into one of these variants. Nothing here is
//! retried automatically.

use alloy::primitives::TxHash;
use thiserror::Error;

/// Errors returned by randomness requests.
#[derive(Debug, Error)]
pub enum RandomnessError {
    /// No wallet provider is present in the execution environment.
    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),

    /// The user declined a wallet prompt.
    #[error("User rejected the request")]
    UserRejected,

    /// The wallet could not be moved onto the required network.
    #[error("Network switch failed: {0}")]
    NetworkSwitchFailed(String),

    /// The read endpoint could not be reached or serves the wrong chain.
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Request parameters were rejected before any remote call.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A contract call reverted or its output could not be decoded.
    #[error("Contract call failed: {0}")]
    ContractCallFailed(String),

    /// The transaction was mined but reverted.
    #[error("Transaction {tx_hash} failed: {reason}")]
    TransactionFailed { tx_hash: TxHash, reason: String },

    /// The confirmed receipt holds no event with the expected name.
    #[error("Event {0} not found in transaction receipt")]
    EventNotFound(&'static str),

    /// A decoded event does not belong to the originating request.
    #[error("Correlation mismatch on {field}: expected {expected}, got {actual}")]
    CorrelationMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },

    /// The transaction was not confirmed within the configured deadline.
    #[error("Transaction {tx_hash} not confirmed within {timeout_secs} seconds")]
    ConfirmationTimeout { tx_hash: TxHash, timeout_secs: u64 },

    /// The caller cancelled the wait.
    #[error("Request cancelled")]
    Cancelled,
}

impl RandomnessError {
    /// Short stable label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WalletUnavailable(_) => "wallet_unavailable",
            Self::UserRejected => "user_rejected",
            Self::NetworkSwitchFailed(_) => "network_switch_failed",
            Self::NetworkUnavailable(_) => "network_unavailable",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::ContractCallFailed(_) => "contract_call_failed",
            Self::TransactionFailed { .. } => "transaction_failed",
            Self::EventNotFound(_) => "event_not_found",
            Self::CorrelationMismatch { .. } => "correlation_mismatch",
            Self::ConfirmationTimeout { .. } => "confirmation_timeout",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Result type for randomness operations.
pub type Result<T> = std::result::Result<T, RandomnessError>;
