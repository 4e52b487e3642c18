//! Blockchain access subsystem.
//!
//! # Data Flow
//! ```text
//! NetworkDescriptor (RPC URL, chain ID)
//!     → client.rs (read-only RPC with timeouts and failover)
//!     → transaction.rs (receipt polling, confirmation depth, deadline)
//! ```
//!
//! # Constraints
//! - All RPC calls have configurable timeouts
//! - Reads never require a wallet
//! - Signing happens in the wallet, never here

pub mod client;
pub mod transaction;
pub mod types;

pub use client::{ChainRpc, RpcClient};
pub use transaction::{ConfirmationPolicy, ConfirmationWatcher};
pub use types::{ChainId, ConfirmationStatus, ConfirmedReceipt, RpcError, RpcResult};
