//! Transactional request orchestration.
//!
//! # Data Flow
//! ```text
//! RandomnessRequest (verifiable)
//!     → SessionManager::ensure_session (authorize, validate network)
//!     → ReadOnlyClient::connection (for receipt polling)
//!     → RandomnessContract signing entry point (wallet signs and broadcasts)
//!     → ConfirmationWatcher::wait (deadline + cancellation)
//!     → EventCorrelator (request id, typed result)
//! ```
//!
//! The read connection is opened before anything is submitted, so an
//! unreachable endpoint never leaves an unobserved transaction behind.

use alloy::primitives::Address;
use std::sync::Arc;

use crate::blockchain::transaction::{ConfirmationPolicy, ConfirmationWatcher};
use crate::blockchain::types::ConfirmedReceipt;
use crate::contract::events::EventCorrelator;
use crate::error::{RandomnessError, Result};
use crate::lifecycle::CancelToken;
use crate::randomness::instant::ReadOnlyClient;
use crate::randomness::types::{Mode, RandomnessRequest, RandomnessResult, RequestKind, RequestReceipt};
use crate::wallet::provider::ProviderError;
use crate::wallet::session::SessionManager;

/// A verifiable request that has been mined.
#[derive(Debug, Clone)]
pub struct Submission {
    pub receipt: RequestReceipt,
    pub confirmed: ConfirmedReceipt,
    /// Account that signed the transaction.
    pub requester: Address,
}

/// Submits verifiable requests and waits for them.
pub struct VerifiableOrchestrator {
    sessions: Arc<SessionManager>,
    reads: Arc<ReadOnlyClient>,
    correlator: EventCorrelator,
    policy: ConfirmationPolicy,
}

impl VerifiableOrchestrator {
    pub fn new(sessions: Arc<SessionManager>, reads: Arc<ReadOnlyClient>, policy: ConfirmationPolicy) -> Self {
        let correlator = EventCorrelator::new(reads.contract().address());
        Self {
            sessions,
            reads,
            correlator,
            policy,
        }
    }

    /// Submit the request and wait until its transaction is confirmed.
    pub async fn submit(&self, request: &RandomnessRequest, cancel: &CancelToken) -> Result<Submission> {
        if request.mode != Mode::Verifiable {
            return Err(RandomnessError::InvalidArgument(
                "only verifiable requests are submitted on-chain".to_string(),
            ));
        }
        request.validate()?;

        let session = self.sessions.ensure_session().await?;
        let rpc = self.reads.connection().await?;

        let contract = self.reads.contract();
        let signer = session.signer();
        let submitted = match &request.kind {
            RequestKind::Number { min, max } => {
                contract
                    .generate_verifiable_random_number(signer, *min, *max)
                    .await
            }
            RequestKind::Selection { items } => contract.generate_verifiable_random_item(signer, items).await,
            RequestKind::Decision => contract.make_yolo_decision(signer).await,
        };
        let tx_hash = submitted.map_err(classify_submission_error)?;
        tracing::info!(
            tx_hash = %tx_hash,
            kind = request.kind.as_str(),
            account = %signer.account(),
            "Verifiable request submitted"
        );

        let watcher = ConfirmationWatcher::new(rpc, self.policy.clone());
        let confirmed = watcher.wait(tx_hash, cancel).await?;
        let receipt = self
            .correlator
            .request_receipt(&confirmed, request.kind.verifiable_event())?;

        Ok(Submission {
            receipt,
            confirmed,
            requester: signer.account(),
        })
    }

    /// Submit, confirm and correlate.
    pub async fn request(&self, request: &RandomnessRequest, cancel: &CancelToken) -> Result<RandomnessResult> {
        let submission = self.submit(request, cancel).await?;
        let result = self.correlator.extract(
            &submission.confirmed,
            &request.kind,
            &submission.receipt,
            submission.requester,
        )?;
        tracing::info!(
            tx_hash = %submission.receipt.transaction_hash,
            request_id = %submission.receipt.request_id,
            block_number = submission.receipt.block_number,
            "Verifiable randomness confirmed"
        );
        Ok(result)
    }
}

fn classify_submission_error(e: ProviderError) -> RandomnessError {
    if e.is_user_rejected() {
        RandomnessError::UserRejected
    } else {
        RandomnessError::ContractCallFailed(e.to_string())
    }
}
