//! End-to-end tests of the verifiable request path against mocks.

use alloy::primitives::{TxHash, B256};
use std::sync::atomic::Ordering;
use std::time::Duration;

use randomness_client::randomness::types::RandomnessOutcome;
use randomness_client::wallet::{InvalidationReason, ProviderEvent, SessionEvent};
use randomness_client::{Cancellation, Mode, RandomnessError, RandomnessRequest};

mod common;
use common::{MockChain, MockWallet, ACCOUNT};

fn tx_abc() -> TxHash {
    TxHash::left_padding_from(&[0x0a, 0xbc])
}

#[tokio::test]
async fn test_wrong_chain_request_yields_correlated_number() {
    let wallet = MockWallet::on_chain(1, true);
    wallet.set_tx_hash(tx_abc());
    let chain = MockChain::new();
    let request_id = B256::with_last_byte(0x01);
    chain.add_receipt(common::receipt(
        tx_abc(),
        1000,
        true,
        vec![common::number_event(request_id, 42, 1, 100, 1000)],
    ));
    let service = common::service(Some(wallet.clone()), chain);

    let result = service
        .request_verifiable(&RandomnessRequest::number(Mode::Verifiable, 1, 100))
        .await
        .unwrap();

    assert_eq!(result.outcome, RandomnessOutcome::Number { value: 42 });
    assert_eq!(result.transaction_hash(), Some(tx_abc()));
    assert_eq!(result.block_number(), Some(1000));
    assert_eq!(result.request_id(), Some(request_id));
    assert_eq!(result.provenance.requester, Some(ACCOUNT));
    assert_eq!(wallet.switches.load(Ordering::SeqCst), 1);
    assert_eq!(wallet.submission_count(), 1);
}

#[tokio::test]
async fn test_unknown_network_is_registered_then_switched() {
    let wallet = MockWallet::on_chain(1, false);
    let chain = MockChain::new();
    let tx = TxHash::repeat_byte(0x11);
    chain.add_receipt(common::receipt(
        tx,
        1000,
        true,
        vec![common::number_event(B256::with_last_byte(2), 5, 1, 10, 1000)],
    ));
    let service = common::service(Some(wallet.clone()), chain);

    service
        .request_verifiable(&RandomnessRequest::number(Mode::Verifiable, 1, 10))
        .await
        .unwrap();

    assert_eq!(wallet.switches.load(Ordering::SeqCst), 2);
    assert_eq!(wallet.registrations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_repeated_requests_prompt_once() {
    let wallet = MockWallet::on_chain(747, true);
    let chain = MockChain::new();
    let tx = TxHash::repeat_byte(0x11);
    chain.add_receipt(common::receipt(
        tx,
        1000,
        true,
        vec![common::number_event(B256::with_last_byte(3), 5, 1, 10, 1000)],
    ));
    let service = common::service(Some(wallet.clone()), chain);
    let request = RandomnessRequest::number(Mode::Verifiable, 1, 10);

    service.request_verifiable(&request).await.unwrap();
    service.request_verifiable(&request).await.unwrap();

    assert_eq!(wallet.prompts.load(Ordering::SeqCst), 1);
    assert_eq!(wallet.switches.load(Ordering::SeqCst), 0);
    assert_eq!(wallet.submission_count(), 2);
}

#[tokio::test]
async fn test_rejected_authorization_submits_nothing() {
    let wallet = MockWallet::on_chain(747, true);
    wallet.reject_accounts.store(true, Ordering::SeqCst);
    let chain = MockChain::new();
    let service = common::service(Some(wallet.clone()), chain.clone());

    let err = service
        .request_verifiable(&RandomnessRequest::number(Mode::Verifiable, 1, 100))
        .await
        .unwrap_err();

    assert!(matches!(err, RandomnessError::UserRejected));
    assert_eq!(wallet.submission_count(), 0);
    assert_eq!(chain.receipt_polls.load(Ordering::SeqCst), 0);
    assert!(service.sessions().current().is_none());
}

#[tokio::test]
async fn test_rejected_signature() {
    let wallet = MockWallet::on_chain(747, true);
    wallet.reject_transactions.store(true, Ordering::SeqCst);
    let service = common::service(Some(wallet), MockChain::new());

    let err = service
        .request_verifiable(&RandomnessRequest::selection(Mode::Verifiable, ["a", "b"]))
        .await
        .unwrap_err();
    assert!(matches!(err, RandomnessError::UserRejected));
}

#[tokio::test]
async fn test_no_wallet() {
    let service = common::service(None, MockChain::new());
    let err = service
        .request_verifiable(&RandomnessRequest::decision())
        .await
        .unwrap_err();
    assert!(matches!(err, RandomnessError::WalletUnavailable(_)));
}

#[tokio::test]
async fn test_reverted_transaction() {
    let wallet = MockWallet::on_chain(747, true);
    let chain = MockChain::new();
    chain.add_receipt(common::receipt(TxHash::repeat_byte(0x11), 1000, false, Vec::new()));
    let service = common::service(Some(wallet), chain);

    let err = service
        .request_verifiable(&RandomnessRequest::number(Mode::Verifiable, 1, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, RandomnessError::TransactionFailed { .. }));
}

#[tokio::test]
async fn test_missing_event() {
    let wallet = MockWallet::on_chain(747, true);
    let chain = MockChain::new();
    chain.add_receipt(common::receipt(
        TxHash::repeat_byte(0x11),
        1000,
        true,
        vec![common::unrelated_log()],
    ));
    let service = common::service(Some(wallet), chain);

    let err = service
        .request_verifiable(&RandomnessRequest::number(Mode::Verifiable, 0, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, RandomnessError::EventNotFound(_)));
}

#[tokio::test]
async fn test_selection_skips_unrelated_log() {
    let wallet = MockWallet::on_chain(747, true);
    let chain = MockChain::new();
    let items = ["red", "green", "blue"];
    chain.add_receipt(common::receipt(
        TxHash::repeat_byte(0x11),
        1000,
        true,
        vec![
            common::unrelated_log(),
            common::selection_event(B256::with_last_byte(9), &items, 2, 1000),
        ],
    ));
    let service = common::service(Some(wallet), chain);

    let result = service
        .request_verifiable(&RandomnessRequest::selection(Mode::Verifiable, items))
        .await
        .unwrap();
    assert_eq!(result.item(), Some(("blue", 2)));
    assert_eq!(result.request_id(), Some(B256::with_last_byte(9)));
}

#[tokio::test]
async fn test_confirmation_timeout() {
    let wallet = MockWallet::on_chain(747, true);
    // Never mined.
    let service = common::service(Some(wallet), MockChain::new());

    let err = service
        .request_verifiable(&RandomnessRequest::number(Mode::Verifiable, 1, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, RandomnessError::ConfirmationTimeout { timeout_secs: 1, .. }));
}

#[tokio::test]
async fn test_cancellation_stops_wait() {
    let wallet = MockWallet::on_chain(747, true);
    let service = common::service(Some(wallet.clone()), MockChain::new());
    let cancellation = Cancellation::new();
    let token = cancellation.token();
    let request = RandomnessRequest::number(Mode::Verifiable, 1, 10);

    let (result, _) = tokio::join!(service.request_verifiable_with_cancel(&request, &token), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancellation.cancel();
    });

    assert!(matches!(result, Err(RandomnessError::Cancelled)));
    // The transaction itself was still submitted.
    assert_eq!(wallet.submission_count(), 1);
}

#[tokio::test]
async fn test_account_removal_forces_new_handshake() {
    let wallet = MockWallet::on_chain(747, true);
    let chain = MockChain::new();
    chain.add_receipt(common::receipt(
        TxHash::repeat_byte(0x11),
        1000,
        true,
        vec![common::number_event(B256::with_last_byte(4), 3, 1, 10, 1000)],
    ));
    let service = common::service(Some(wallet.clone()), chain);
    let sessions = service.sessions().clone();
    assert!(sessions.mount());
    assert!(!sessions.mount());
    assert_eq!(wallet.listeners(), 1);
    let mut observer = sessions.observe();

    let request = RandomnessRequest::number(Mode::Verifiable, 1, 10);
    service.request_verifiable(&request).await.unwrap();
    assert!(matches!(observer.recv().await.unwrap(), SessionEvent::Established { .. }));

    wallet.emit(ProviderEvent::AccountsChanged(Vec::new()));
    assert_eq!(
        observer.recv().await.unwrap(),
        SessionEvent::Invalidated(InvalidationReason::AccountsRemoved)
    );
    assert!(common::eventually(|| sessions.current().is_none()).await);

    service.request_verifiable(&request).await.unwrap();
    assert_eq!(wallet.prompts.load(Ordering::SeqCst), 2);

    sessions.unmount();
    assert!(common::eventually(|| wallet.listeners() == 0).await);
}

#[tokio::test]
async fn test_verify_against_stored_record() {
    use randomness_client::contract::abi::RandomGeneration;
    use alloy::primitives::U256;

    let wallet = MockWallet::on_chain(747, true);
    let chain = MockChain::new();
    let request_id = B256::with_last_byte(0x01);
    chain.add_receipt(common::receipt(
        TxHash::repeat_byte(0x11),
        1000,
        true,
        vec![common::number_event(request_id, 42, 1, 100, 1000)],
    ));
    chain.store_generation(
        request_id,
        RandomGeneration {
            result: 42,
            min: 1,
            max: 100,
            requester: ACCOUNT,
            timestamp: U256::from(1_700_000_000u64),
            blockNumber: U256::from(1000),
        },
    );
    let service = common::service(Some(wallet), chain);

    let result = service
        .request_verifiable(&RandomnessRequest::number(Mode::Verifiable, 1, 100))
        .await
        .unwrap();
    let verification = service.verify(&result).await.unwrap();
    assert!(verification.is_valid());
    assert_eq!(verification.record.block_number, 1000);

    let mut tampered = result.clone();
    tampered.outcome = RandomnessOutcome::Number { value: 43 };
    let verification = service.verify(&tampered).await.unwrap();
    assert_eq!(verification.mismatches.len(), 1);
    assert_eq!(verification.mismatches[0].field, "value");

    let mut unknown = result;
    unknown.provenance.request_id = Some(B256::with_last_byte(0x77));
    let err = service.verify(&unknown).await.unwrap_err();
    assert!(matches!(err, RandomnessError::ContractCallFailed(_)));
}
