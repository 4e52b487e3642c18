//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Cancellation (cancel.rs):
//!     owner → Cancellation::cancel → every CancelToken resolves
//!
//! Signals (signals.rs):
//!     SIGINT → Cancellation::cancel
//! ```
//!
//! # Design Decisions
//! - Cancellation is sticky: late observers see it immediately
//! - Cancelling a wait never cancels the on-chain transaction

pub mod cancel;
pub mod signals;

pub use cancel::{CancelToken, Cancellation};
