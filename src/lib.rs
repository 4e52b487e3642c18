//! Verifiable randomness client library.

pub mod blockchain;
pub mod config;
pub mod contract;
pub mod error;
pub mod lifecycle;
pub mod network;
pub mod observability;
pub mod randomness;
pub mod resilience;
pub mod wallet;

pub use config::schema::AppConfig;
pub use error::{RandomnessError, Result};
pub use lifecycle::{CancelToken, Cancellation};
pub use network::{ChainRegistry, NetworkDescriptor};
pub use randomness::{Mode, RandomnessRequest, RandomnessResult, RandomnessService};
pub use wallet::{LocalWallet, SessionManager, WalletProvider};
