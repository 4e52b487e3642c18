//! Request and result types of the randomness pipeline.

use alloy::primitives::{Address, TxHash, B256};
use serde::{Deserialize, Serialize};

use crate::contract::events::EventName;
use crate::error::{RandomnessError, Result};

/// How randomness is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Read-only call, no transaction.
    Instant,
    /// State-changing call anchored in a mined transaction.
    Verifiable,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instant => "instant",
            Self::Verifiable => "verifiable",
        }
    }
}

/// What is being requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestKind {
    Number { min: u64, max: u64 },
    Selection { items: Vec<String> },
    Decision,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number { .. } => "number",
            Self::Selection { .. } => "selection",
            Self::Decision => "decision",
        }
    }

    /// Event the contract emits for a verifiable request of this kind.
    pub fn verifiable_event(&self) -> EventName {
        match self {
            Self::Number { .. } => EventName::VerifiableRandomNumberGenerated,
            Self::Selection { .. } => EventName::VerifiableRandomItemSelected,
            Self::Decision => EventName::YoloDecisionMade,
        }
    }
}

/// A single randomness request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomnessRequest {
    pub mode: Mode,
    #[serde(flatten)]
    pub kind: RequestKind,
}

impl RandomnessRequest {
    pub fn number(mode: Mode, min: u64, max: u64) -> Self {
        Self {
            mode,
            kind: RequestKind::Number { min, max },
        }
    }

    pub fn selection<I, S>(mode: Mode, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode,
            kind: RequestKind::Selection {
                items: items.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// A YOLO decision; only exists in verifiable mode.
    pub fn decision() -> Self {
        Self {
            mode: Mode::Verifiable,
            kind: RequestKind::Decision,
        }
    }

    /// Check the parameters before any remote call is made.
    pub fn validate(&self) -> Result<()> {
        match &self.kind {
            RequestKind::Number { min, max } if min > max => Err(RandomnessError::InvalidArgument(format!(
                "min ({}) must not exceed max ({})",
                min, max
            ))),
            RequestKind::Selection { items } if items.is_empty() => Err(RandomnessError::InvalidArgument(
                "item list must not be empty".to_string(),
            )),
            RequestKind::Selection { items } => match items.iter().position(|i| i.is_empty()) {
                Some(pos) => Err(RandomnessError::InvalidArgument(format!("item {} is empty", pos))),
                None => Ok(()),
            },
            RequestKind::Decision if self.mode == Mode::Instant => Err(RandomnessError::InvalidArgument(
                "decisions are only available in verifiable mode".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// A confirmed verifiable submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestReceipt {
    pub transaction_hash: TxHash,
    pub block_number: u64,
    /// Correlation identifier chosen by the contract.
    pub request_id: B256,
}

/// The random value itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RandomnessOutcome {
    Number {
        value: u64,
    },
    Selection {
        item: String,
        index: u64,
    },
    Decision {
        decision: String,
        advice: String,
        #[serde(rename = "randomValue")]
        random_value: u64,
    },
}

/// Where a result came from. Instant results leave every optional field empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<TxHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<B256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl Provenance {
    pub fn instant() -> Self {
        Self {
            mode: Mode::Instant,
            transaction_hash: None,
            block_number: None,
            request_id: None,
            requester: None,
            timestamp: None,
        }
    }
}

/// A typed result paired with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomnessResult {
    #[serde(flatten)]
    pub outcome: RandomnessOutcome,
    pub provenance: Provenance,
}

impl RandomnessResult {
    pub fn instant(outcome: RandomnessOutcome) -> Self {
        Self {
            outcome,
            provenance: Provenance::instant(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.provenance.mode
    }

    /// The number, for number results.
    pub fn value(&self) -> Option<u64> {
        match self.outcome {
            RandomnessOutcome::Number { value } => Some(value),
            _ => None,
        }
    }

    /// The item and its index, for selection results.
    pub fn item(&self) -> Option<(&str, u64)> {
        match &self.outcome {
            RandomnessOutcome::Selection { item, index } => Some((item.as_str(), *index)),
            _ => None,
        }
    }

    pub fn transaction_hash(&self) -> Option<TxHash> {
        self.provenance.transaction_hash
    }

    pub fn block_number(&self) -> Option<u64> {
        self.provenance.block_number
    }

    pub fn request_id(&self) -> Option<B256> {
        self.provenance.request_id
    }
}

/// Which on-chain record to look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Number,
    Selection,
    Decision,
}

impl RecordKind {
    pub fn of(outcome: &RandomnessOutcome) -> Self {
        match outcome {
            RandomnessOutcome::Number { .. } => Self::Number,
            RandomnessOutcome::Selection { .. } => Self::Selection,
            RandomnessOutcome::Decision { .. } => Self::Decision,
        }
    }
}

impl std::str::FromStr for RecordKind {
    type Err = RandomnessError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "number" => Ok(Self::Number),
            "selection" => Ok(Self::Selection),
            "decision" => Ok(Self::Decision),
            other => Err(RandomnessError::InvalidArgument(format!("unknown record kind '{}'", other))),
        }
    }
}

/// A record stored by the contract for a verifiable request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnChainRecord {
    pub request_id: B256,
    #[serde(flatten)]
    pub outcome: RandomnessOutcome,
    pub requester: Address,
    pub block_number: u64,
    pub timestamp: u64,
}

/// A field whose stored value differs from the reported result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMismatch {
    pub field: &'static str,
    pub reported: String,
    pub stored: String,
}

/// Outcome of re-deriving a verifiable result from chain state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub record: OnChainRecord,
    pub mismatches: Vec<FieldMismatch>,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        self.mismatches.is_empty()
    }
}
