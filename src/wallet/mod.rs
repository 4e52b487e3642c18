//! Wallet subsystem.
//!
//! # Data Flow
//! ```text
//! WalletProvider (injected wallet or LocalWallet)
//!     → session.rs (authorize, validate network, bind signer)
//!     → SessionSigner (used by the verifiable request path)
//! ```

pub mod local;
pub mod provider;
pub mod session;

pub use local::LocalWallet;
pub use provider::{ProviderError, ProviderEvent, WalletProvider};
pub use session::{InvalidationReason, Session, SessionEvent, SessionManager, SessionSigner};
