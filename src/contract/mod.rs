//! Randomness contract interface.
//!
//! # Data Flow
//! ```text
//! abi.rs (sol! declarations)
//!     → binding.rs (read calls over ChainRpc, signed calls over SessionSigner)
//!     → events.rs (receipt logs → typed events → correlated result)
//! ```

pub mod abi;
pub mod binding;
pub mod events;

pub use binding::RandomnessContract;
pub use events::{DecodedEvent, EventCorrelator, EventName};
