//! Dual-mode randomness pipeline.
//!
//! # Data Flow
//! ```text
//! instant:    RandomnessService::query_instant
//!                 → ReadOnlyClient (lazy connection) → contract view → RandomnessResult
//!
//! verifiable: RandomnessService::request_verifiable
//!                 → VerifiableOrchestrator (session, submit, confirm)
//!                 → EventCorrelator → RandomnessResult with provenance
//! ```
//!
//! # Constraints
//! - Nothing is retried automatically
//! - A verifiable result always comes from a confirmed receipt
//! - Results are never clamped or substituted

pub mod instant;
pub mod service;
pub mod types;
pub mod verifiable;

pub use instant::{HttpConnector, ReadOnlyClient, RpcConnector};
pub use service::RandomnessService;
pub use types::{
    Mode, OnChainRecord, Provenance, RandomnessOutcome, RandomnessRequest, RandomnessResult, RecordKind,
    RequestKind, RequestReceipt, Verification,
};
pub use verifiable::{Submission, VerifiableOrchestrator};
