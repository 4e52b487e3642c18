//! Typed proxy over the randomness contract.
//!
//! Read entry points run over a [`ChainRpc`]; mutating entry points are
//! signed through a [`SessionSigner`]. Errors pass through in the lower
//! layer's own types so the caller can classify them.

use alloy::primitives::{Address, Bytes, TxHash, B256};
use alloy::sol_types::{SolCall, SolError};

use crate::blockchain::client::ChainRpc;
use crate::blockchain::types::{RpcError, RpcResult};
use crate::contract::abi::{
    generateVerifiableRandomItemCall, generateVerifiableRandomNumberCall, getGenerationDetailsCall,
    getRandomNumberCall, getSelectionDetailsCall, getYoloDetailsCall, makeYoloDecisionCall,
    selectRandomItemCall, EmptyItemArray, RandomGeneration, RandomSelection, YoloDecision,
};
use crate::wallet::provider::ProviderError;
use crate::wallet::session::SessionSigner;

/// The randomness contract at a fixed address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomnessContract {
    address: Address,
}

impl RandomnessContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    async fn view<C: SolCall>(&self, rpc: &dyn ChainRpc, call: C) -> RpcResult<C::Return> {
        let output = rpc.call(self.address, Bytes::from(call.abi_encode())).await?;
        C::abi_decode_returns(&output)
            .map_err(|e| RpcError::Decode(format!("{}: {}", C::SIGNATURE, e)))
    }

    async fn transact<C: SolCall>(&self, signer: &SessionSigner, call: C) -> Result<TxHash, ProviderError> {
        let input = Bytes::from(call.abi_encode());
        tracing::debug!(
            function = C::SIGNATURE,
            contract = %self.address,
            account = %signer.account(),
            "Submitting contract transaction"
        );
        signer.send_transaction(self.address, input).await
    }

    // Read-only entry points.

    pub async fn get_random_number(&self, rpc: &dyn ChainRpc, min: u64, max: u64) -> RpcResult<u64> {
        self.view(rpc, getRandomNumberCall { min, max }).await
    }

    pub async fn select_random_item(&self, rpc: &dyn ChainRpc, items: &[String]) -> RpcResult<String> {
        self.view(rpc, selectRandomItemCall { items: items.to_vec() }).await
    }

    pub async fn generation_details(&self, rpc: &dyn ChainRpc, generation_id: B256) -> RpcResult<RandomGeneration> {
        self.view(rpc, getGenerationDetailsCall { generationId: generation_id }).await
    }

    pub async fn selection_details(&self, rpc: &dyn ChainRpc, selection_id: B256) -> RpcResult<RandomSelection> {
        self.view(rpc, getSelectionDetailsCall { selectionId: selection_id }).await
    }

    pub async fn yolo_details(&self, rpc: &dyn ChainRpc, decision_id: B256) -> RpcResult<YoloDecision> {
        self.view(rpc, getYoloDetailsCall { decisionId: decision_id }).await
    }

    // Signing entry points. Each returns the hash of the submitted transaction.

    pub async fn generate_verifiable_random_number(
        &self,
        signer: &SessionSigner,
        min: u64,
        max: u64,
    ) -> Result<TxHash, ProviderError> {
        self.transact(signer, generateVerifiableRandomNumberCall { min, max }).await
    }

    pub async fn generate_verifiable_random_item(
        &self,
        signer: &SessionSigner,
        items: &[String],
    ) -> Result<TxHash, ProviderError> {
        self.transact(signer, generateVerifiableRandomItemCall { items: items.to_vec() })
            .await
    }

    pub async fn make_yolo_decision(&self, signer: &SessionSigner) -> Result<TxHash, ProviderError> {
        self.transact(signer, makeYoloDecisionCall {}).await
    }
}

/// Human-readable reason for a reverted call, decoding known custom errors.
pub fn revert_reason(message: &str, data: Option<&Bytes>) -> String {
    match data {
        Some(data) if EmptyItemArray::abi_decode(data).is_ok() => "EmptyItemArray()".to_string(),
        _ => message.to_string(),
    }
}
