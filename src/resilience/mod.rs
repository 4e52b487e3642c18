//! Resilience helpers.
//!
//! # Data Flow
//! ```text
//! Confirmation wait:
//!     → backoff.rs (delay between receipt polls)
//!     → bounded overall by confirmation.timeout_secs
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline (see blockchain::client)
//! - Nothing user-facing is retried; polling a receipt is not a retry

pub mod backoff;
