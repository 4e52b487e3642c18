//! The produced interface: instant queries, verifiable requests and
//! re-derivation of verifiable results from chain state.

use alloy::primitives::{Address, B256, U256};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::blockchain::transaction::ConfirmationPolicy;
use crate::config::schema::AppConfig;
use crate::error::{RandomnessError, Result};
use crate::lifecycle::CancelToken;
use crate::network::{ChainRegistry, NetworkDescriptor};
use crate::observability::metrics;
use crate::randomness::instant::{classify_call_error, HttpConnector, ReadOnlyClient, RpcConnector};
use crate::randomness::types::{
    FieldMismatch, Mode, OnChainRecord, RandomnessOutcome, RandomnessRequest, RandomnessResult, RecordKind,
    Verification,
};
use crate::randomness::verifiable::VerifiableOrchestrator;
use crate::wallet::provider::WalletProvider;
use crate::wallet::session::SessionManager;

/// Entry point for randomness requests.
pub struct RandomnessService {
    registry: ChainRegistry,
    reads: Arc<ReadOnlyClient>,
    sessions: Arc<SessionManager>,
    orchestrator: VerifiableOrchestrator,
}

impl RandomnessService {
    /// Build a service over HTTP JSON-RPC.
    ///
    /// `provider` is `None` when no wallet is available; instant queries
    /// still work, verifiable requests fail with `WalletUnavailable`.
    pub fn from_config(config: &AppConfig, provider: Option<Arc<dyn WalletProvider>>) -> Result<Self> {
        let connector = HttpConnector::new(
            config.network.failover_urls.clone(),
            Duration::from_secs(config.rpc.timeout_secs),
        );
        Self::with_connector(config, provider, Arc::new(connector))
    }

    /// Build a service with a custom read connector.
    pub fn with_connector(
        config: &AppConfig,
        provider: Option<Arc<dyn WalletProvider>>,
        connector: Arc<dyn RpcConnector>,
    ) -> Result<Self> {
        let contract: Address = config.contract.address.parse().map_err(|e| {
            RandomnessError::InvalidArgument(format!(
                "invalid contract address '{}': {}",
                config.contract.address, e
            ))
        })?;

        let registry = ChainRegistry::from_config(&config.network);
        let reads = Arc::new(ReadOnlyClient::new(
            registry.required_network().clone(),
            contract,
            connector,
        ));
        let sessions = Arc::new(SessionManager::new(provider, registry.clone()));
        let orchestrator = VerifiableOrchestrator::new(
            sessions.clone(),
            reads.clone(),
            ConfirmationPolicy::from(&config.confirmation),
        );

        tracing::debug!(
            contract = %contract,
            chain_id = %registry.required_network().chain_id,
            wallet = sessions.has_provider(),
            "Randomness service created"
        );

        Ok(Self {
            registry,
            reads,
            sessions,
            orchestrator,
        })
    }

    pub fn network(&self) -> &NetworkDescriptor {
        self.registry.required_network()
    }

    pub fn contract_address(&self) -> Address {
        self.reads.contract().address()
    }

    /// The wallet session manager, for lifecycle control and observation.
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Instant randomness; no wallet involved.
    pub async fn query_instant(&self, request: &RandomnessRequest) -> Result<RandomnessResult> {
        let started = Instant::now();
        let result = self.reads.query(request).await;
        observe(request, &result, started);
        result
    }

    /// Verifiable randomness, waiting without external cancellation.
    pub async fn request_verifiable(&self, request: &RandomnessRequest) -> Result<RandomnessResult> {
        self.request_verifiable_with_cancel(request, &CancelToken::never()).await
    }

    /// Verifiable randomness; `cancel` stops the confirmation wait.
    pub async fn request_verifiable_with_cancel(
        &self,
        request: &RandomnessRequest,
        cancel: &CancelToken,
    ) -> Result<RandomnessResult> {
        let started = Instant::now();
        let result = self.orchestrator.request(request, cancel).await;
        observe(request, &result, started);
        result
    }

    /// Read the record the contract stored for a verifiable request.
    pub async fn record(&self, kind: RecordKind, request_id: B256) -> Result<OnChainRecord> {
        let rpc = self.reads.connection().await?;
        let contract = self.reads.contract();

        let (outcome, requester, block_number, timestamp) = match kind {
            RecordKind::Number => {
                let r = contract
                    .generation_details(rpc.as_ref(), request_id)
                    .await
                    .map_err(classify_call_error)?;
                (RandomnessOutcome::Number { value: r.result }, r.requester, r.blockNumber, r.timestamp)
            }
            RecordKind::Selection => {
                let r = contract
                    .selection_details(rpc.as_ref(), request_id)
                    .await
                    .map_err(classify_call_error)?;
                let index = u64::try_from(r.index).map_err(|_| {
                    RandomnessError::ContractCallFailed(format!("stored index {} out of range", r.index))
                })?;
                (
                    RandomnessOutcome::Selection { item: r.result, index },
                    r.requester,
                    r.blockNumber,
                    r.timestamp,
                )
            }
            RecordKind::Decision => {
                let r = contract
                    .yolo_details(rpc.as_ref(), request_id)
                    .await
                    .map_err(classify_call_error)?;
                (
                    RandomnessOutcome::Decision {
                        decision: r.decision,
                        advice: r.advice,
                        random_value: r.randomValue,
                    },
                    r.requester,
                    r.blockNumber,
                    r.timestamp,
                )
            }
        };

        // Unknown ids read back as zeroed structs.
        if block_number.is_zero() {
            return Err(RandomnessError::ContractCallFailed(format!(
                "no {:?} record for {}",
                kind, request_id
            )));
        }

        Ok(OnChainRecord {
            request_id,
            outcome,
            requester,
            block_number: to_u64("blockNumber", block_number)?,
            timestamp: to_u64("timestamp", timestamp)?,
        })
    }

    /// Re-derive a verifiable result from the contract's stored record.
    pub async fn verify(&self, result: &RandomnessResult) -> Result<Verification> {
        let request_id = match (result.mode(), result.request_id()) {
            (Mode::Verifiable, Some(id)) => id,
            _ => {
                return Err(RandomnessError::InvalidArgument(
                    "only verifiable results can be verified".to_string(),
                ))
            }
        };

        let record = self.record(RecordKind::of(&result.outcome), request_id).await?;
        let mismatches = compare(result, &record);
        if mismatches.is_empty() {
            tracing::info!(request_id = %request_id, "Result matches on-chain record");
        } else {
            tracing::warn!(
                request_id = %request_id,
                mismatches = mismatches.len(),
                "Result differs from on-chain record"
            );
        }
        Ok(Verification { record, mismatches })
    }

    /// Explorer link for a verifiable result's transaction.
    pub fn explorer_url(&self, result: &RandomnessResult) -> Option<String> {
        result
            .transaction_hash()
            .map(|hash| self.network().transaction_url(&hash))
    }
}

fn observe(request: &RandomnessRequest, result: &Result<RandomnessResult>, started: Instant) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::record_request(request.mode.as_str(), request.kind.as_str(), outcome, started.elapsed());
}

fn to_u64(field: &'static str, value: U256) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| RandomnessError::ContractCallFailed(format!("stored {} {} out of range", field, value)))
}

fn compare(result: &RandomnessResult, record: &OnChainRecord) -> Vec<FieldMismatch> {
    let mut mismatches = Vec::new();
    let mut check = |field: &'static str, reported: String, stored: String| {
        if reported != stored {
            mismatches.push(FieldMismatch {
                field,
                reported,
                stored,
            });
        }
    };

    match (&result.outcome, &record.outcome) {
        (RandomnessOutcome::Number { value: a }, RandomnessOutcome::Number { value: b }) => {
            check("value", a.to_string(), b.to_string());
        }
        (
            RandomnessOutcome::Selection { item: a, index: i },
            RandomnessOutcome::Selection { item: b, index: j },
        ) => {
            check("item", a.clone(), b.clone());
            check("index", i.to_string(), j.to_string());
        }
        (
            RandomnessOutcome::Decision {
                decision: a,
                advice: x,
                random_value: v,
            },
            RandomnessOutcome::Decision {
                decision: b,
                advice: y,
                random_value: w,
            },
        ) => {
            check("decision", a.clone(), b.clone());
            check("advice", x.clone(), y.clone());
            check("randomValue", v.to_string(), w.to_string());
        }
        _ => check("kind", format!("{:?}", result.outcome), format!("{:?}", record.outcome)),
    }

    if let Some(block) = result.block_number() {
        check("blockNumber", block.to_string(), record.block_number.to_string());
    }
    if let Some(requester) = result.provenance.requester {
        check("requester", requester.to_string(), record.requester.to_string());
    }
    mismatches
}
