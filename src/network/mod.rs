//! Network registry.
//!
//! # Data Flow
//! ```text
//! config.network (or built-in Flow EVM mainnet)
//!     → registry.rs (NetworkDescriptor, ChainRegistry)
//!     → read-only client (RPC endpoint, chain check)
//!     → session manager (switch / register target)
//! ```

pub mod registry;

pub use registry::{ChainRegistry, NetworkDescriptor};
