//! Event schema and receipt correlation.
//!
//! # Data Flow
//! ```text
//! ConfirmedReceipt.logs (execution order)
//!     → decode_log (schema table lookup by topic0, contract address only)
//!     → DecodedEvent (closed set, or Unrecognized)
//!     → EventCorrelator (first event with the expected name, checked against the request)
//!     → RandomnessResult
//! ```
//!
//! Unrecognized logs are skipped, never errors: other contracts share the
//! transaction and block.

use alloy::primitives::{Address, Log, B256, U256};
use alloy::sol_types::SolEvent;
use serde::{Deserialize, Serialize};

use crate::blockchain::types::ConfirmedReceipt;
use crate::contract::abi::{
    RandomItemSelected, RandomNumberGenerated, VerifiableRandomItemSelected, VerifiableRandomNumberGenerated,
    YoloDecisionMade,
};
use crate::error::{RandomnessError, Result};
use crate::randomness::types::{
    Mode, Provenance, RandomnessOutcome, RandomnessResult, RequestKind, RequestReceipt,
};

/// Names of the events the contract can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    RandomNumberGenerated,
    RandomItemSelected,
    VerifiableRandomNumberGenerated,
    VerifiableRandomItemSelected,
    YoloDecisionMade,
}

/// topic0 → event name.
const SCHEMA: [(B256, EventName); 5] = [
    (RandomNumberGenerated::SIGNATURE_HASH, EventName::RandomNumberGenerated),
    (RandomItemSelected::SIGNATURE_HASH, EventName::RandomItemSelected),
    (
        VerifiableRandomNumberGenerated::SIGNATURE_HASH,
        EventName::VerifiableRandomNumberGenerated,
    ),
    (
        VerifiableRandomItemSelected::SIGNATURE_HASH,
        EventName::VerifiableRandomItemSelected,
    ),
    (YoloDecisionMade::SIGNATURE_HASH, EventName::YoloDecisionMade),
];

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RandomNumberGenerated => "RandomNumberGenerated",
            Self::RandomItemSelected => "RandomItemSelected",
            Self::VerifiableRandomNumberGenerated => "VerifiableRandomNumberGenerated",
            Self::VerifiableRandomItemSelected => "VerifiableRandomItemSelected",
            Self::YoloDecisionMade => "YoloDecisionMade",
        }
    }

    /// topic0 of this event.
    pub fn signature_hash(&self) -> B256 {
        SCHEMA
            .iter()
            .find(|(_, name)| name == self)
            .map(|(hash, _)| *hash)
            .unwrap_or_default()
    }

    pub fn from_signature_hash(hash: &B256) -> Option<Self> {
        SCHEMA.iter().find(|(h, _)| h == hash).map(|(_, name)| *name)
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A receipt log decoded against the schema table.
#[derive(Debug)]
pub enum DecodedEvent {
    RandomNumberGenerated(RandomNumberGenerated),
    RandomItemSelected(RandomItemSelected),
    VerifiableRandomNumberGenerated(VerifiableRandomNumberGenerated),
    VerifiableRandomItemSelected(VerifiableRandomItemSelected),
    YoloDecisionMade(YoloDecisionMade),
    /// Another contract's log, an unknown topic, or undecodable data.
    Unrecognized,
}

impl DecodedEvent {
    pub fn name(&self) -> Option<EventName> {
        match self {
            Self::RandomNumberGenerated(_) => Some(EventName::RandomNumberGenerated),
            Self::RandomItemSelected(_) => Some(EventName::RandomItemSelected),
            Self::VerifiableRandomNumberGenerated(_) => Some(EventName::VerifiableRandomNumberGenerated),
            Self::VerifiableRandomItemSelected(_) => Some(EventName::VerifiableRandomItemSelected),
            Self::YoloDecisionMade(_) => Some(EventName::YoloDecisionMade),
            Self::Unrecognized => None,
        }
    }

    /// Indexed request id; legacy events carry none.
    pub fn request_id(&self) -> Option<B256> {
        match self {
            Self::VerifiableRandomNumberGenerated(e) => Some(e.generationId),
            Self::VerifiableRandomItemSelected(e) => Some(e.selectionId),
            Self::YoloDecisionMade(e) => Some(e.decisionId),
            _ => None,
        }
    }
}

/// Decode one log emitted by `contract`.
pub fn decode_log(contract: Address, log: &Log) -> DecodedEvent {
    if log.address != contract {
        return DecodedEvent::Unrecognized;
    }
    let Some(name) = log.data.topics().first().and_then(EventName::from_signature_hash) else {
        tracing::debug!(address = %log.address, "Skipping log with unknown topic");
        return DecodedEvent::Unrecognized;
    };

    let data = &log.data;
    let decoded = match name {
        EventName::RandomNumberGenerated => {
            RandomNumberGenerated::decode_log_data(data).map(DecodedEvent::RandomNumberGenerated)
        }
        EventName::RandomItemSelected => {
            RandomItemSelected::decode_log_data(data).map(DecodedEvent::RandomItemSelected)
        }
        EventName::VerifiableRandomNumberGenerated => VerifiableRandomNumberGenerated::decode_log_data(data)
            .map(DecodedEvent::VerifiableRandomNumberGenerated),
        EventName::VerifiableRandomItemSelected => VerifiableRandomItemSelected::decode_log_data(data)
            .map(DecodedEvent::VerifiableRandomItemSelected),
        EventName::YoloDecisionMade => {
            YoloDecisionMade::decode_log_data(data).map(DecodedEvent::YoloDecisionMade)
        }
    };

    decoded.unwrap_or_else(|e| {
        tracing::warn!(event = %name, error = %e, "Skipping malformed contract log");
        DecodedEvent::Unrecognized
    })
}

/// Ties confirmed receipts back to the requests that produced them.
#[derive(Debug, Clone, Copy)]
pub struct EventCorrelator {
    contract: Address,
}

impl EventCorrelator {
    pub fn new(contract: Address) -> Self {
        Self { contract }
    }

    /// Build the request receipt from the first contract log that decodes as
    /// the expected event. Malformed logs are skipped, as in [`Self::extract`].
    pub fn request_receipt(&self, receipt: &ConfirmedReceipt, expected: EventName) -> Result<RequestReceipt> {
        let request_id = self
            .first_event(receipt, expected)
            .and_then(|event| event.request_id())
            .ok_or(RandomnessError::EventNotFound(expected.as_str()))?;

        Ok(RequestReceipt {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            request_id,
        })
    }

    /// Extract the typed result of `kind` from a confirmed receipt.
    ///
    /// The first decoded event with the expected name wins; it must carry
    /// the request's id, requester, echoed inputs and block number.
    pub fn extract(
        &self,
        receipt: &ConfirmedReceipt,
        kind: &RequestKind,
        origin: &RequestReceipt,
        requester: Address,
    ) -> Result<RandomnessResult> {
        let expected = kind.verifiable_event();
        let event = self
            .first_event(receipt, expected)
            .ok_or(RandomnessError::EventNotFound(expected.as_str()))?;

        let check = Check::new(origin, requester);
        let (outcome, timestamp) = match (event, kind) {
            (DecodedEvent::VerifiableRandomNumberGenerated(e), RequestKind::Number { min, max }) => {
                check.common(e.generationId, e.requester, e.blockNumber)?;
                check.field("min", min, &e.min)?;
                check.field("max", max, &e.max)?;
                if e.randomNumber < *min || e.randomNumber > *max {
                    return Err(RandomnessError::ContractCallFailed(format!(
                        "random number {} outside [{}, {}]",
                        e.randomNumber, min, max
                    )));
                }
                (RandomnessOutcome::Number { value: e.randomNumber }, e.timestamp)
            }
            (DecodedEvent::VerifiableRandomItemSelected(e), RequestKind::Selection { items }) => {
                check.common(e.selectionId, e.requester, e.blockNumber)?;
                check.field("items", items, &e.items)?;
                let index = u64::try_from(e.index).map_err(|_| index_error(&e.index))?;
                let stored = usize::try_from(index).ok().and_then(|i| items.get(i));
                if stored != Some(&e.selectedItem) {
                    return Err(RandomnessError::ContractCallFailed(format!(
                        "selected item '{}' is not at index {}",
                        e.selectedItem, index
                    )));
                }
                (
                    RandomnessOutcome::Selection {
                        item: e.selectedItem,
                        index,
                    },
                    e.timestamp,
                )
            }
            (DecodedEvent::YoloDecisionMade(e), RequestKind::Decision) => {
                check.common(e.decisionId, e.requester, e.blockNumber)?;
                (
                    RandomnessOutcome::Decision {
                        decision: e.decision,
                        advice: e.advice,
                        random_value: e.randomValue,
                    },
                    e.timestamp,
                )
            }
            // Unreachable: the event was selected by the kind's expected name.
            _ => return Err(RandomnessError::EventNotFound(expected.as_str())),
        };

        tracing::debug!(
            event = %expected,
            request_id = %origin.request_id,
            tx_hash = %origin.transaction_hash,
            "Correlated contract event"
        );

        Ok(RandomnessResult {
            outcome,
            provenance: Provenance {
                mode: Mode::Verifiable,
                transaction_hash: Some(origin.transaction_hash),
                block_number: Some(origin.block_number),
                request_id: Some(origin.request_id),
                requester: Some(requester),
                timestamp: u64::try_from(timestamp).ok(),
            },
        })
    }

    fn first_event(&self, receipt: &ConfirmedReceipt, expected: EventName) -> Option<DecodedEvent> {
        receipt
            .logs
            .iter()
            .map(|log| decode_log(self.contract, log))
            .find(|event| event.name() == Some(expected))
    }
}

fn index_error(index: &U256) -> RandomnessError {
    RandomnessError::ContractCallFailed(format!("selection index {} out of range", index))
}

/// Compares decoded fields against the originating request.
struct Check<'a> {
    origin: &'a RequestReceipt,
    requester: Address,
}

impl<'a> Check<'a> {
    fn new(origin: &'a RequestReceipt, requester: Address) -> Self {
        Self { origin, requester }
    }

    fn common(&self, request_id: B256, requester: Address, block_number: U256) -> Result<()> {
        self.field("requestId", &self.origin.request_id, &request_id)?;
        self.field("requester", &self.requester, &requester)?;
        self.field("blockNumber", &U256::from(self.origin.block_number), &block_number)
    }

    fn field<T: PartialEq + std::fmt::Debug>(&self, field: &'static str, expected: &T, actual: &T) -> Result<()> {
        if expected == actual {
            return Ok(());
        }
        Err(RandomnessError::CorrelationMismatch {
            field,
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
        })
    }
}
