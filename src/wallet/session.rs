//! Wallet session management.
//!
//! # Lifecycle
//! ```text
//! (none) ──ensure_session: authorize → check chain → switch/register → bind signer──▶ Session
//! Session ──AccountsChanged([])───────▶ (none)
//! Session ──AccountsChanged([a, ..])──▶ Session{account = a}
//! Session ──ChainChanged(other)───────▶ (none)
//! Session ──Disconnected / disconnect()▶ (none)
//! ```
//!
//! Provider notifications are authoritative: stale state is dropped, never
//! reconciled. `ensure_session` is idempotent, so the next request after an
//! invalidation behaves like a fresh one.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::rpc::types::TransactionRequest;
use arc_swap::ArcSwapOption;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::blockchain::types::ChainId;
use crate::error::{RandomnessError, Result};
use crate::network::{ChainRegistry, NetworkDescriptor};
use crate::observability::metrics;
use crate::wallet::provider::{ProviderError, ProviderEvent, WalletProvider};

/// Signing handle bound to the authorized account.
#[derive(Clone)]
pub struct SessionSigner {
    provider: Arc<dyn WalletProvider>,
    account: Address,
    chain_id: ChainId,
}

impl SessionSigner {
    pub fn account(&self) -> Address {
        self.account
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Ask the wallet to sign and broadcast a contract call.
    pub async fn send_transaction(&self, to: Address, input: Bytes) -> std::result::Result<TxHash, ProviderError> {
        let tx = TransactionRequest::default()
            .with_from(self.account)
            .with_to(to)
            .with_input(input)
            .with_chain_id(self.chain_id.0);
        self.provider.send_transaction(tx).await
    }
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

/// An authorized, network-validated wallet connection.
#[derive(Debug, Clone)]
pub struct Session {
    signer: SessionSigner,
}

impl Session {
    fn new(provider: Arc<dyn WalletProvider>, account: Address, chain_id: ChainId) -> Self {
        Self {
            signer: SessionSigner {
                provider,
                account,
                chain_id,
            },
        }
    }

    fn with_account(&self, account: Address) -> Self {
        Self::new(self.signer.provider.clone(), account, self.signer.chain_id)
    }

    pub fn account(&self) -> Address {
        self.signer.account
    }

    pub fn chain_id(&self) -> ChainId {
        self.signer.chain_id
    }

    pub fn signer(&self) -> &SessionSigner {
        &self.signer
    }
}

/// Why a session was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationReason {
    /// The wallet reported no authorized accounts.
    AccountsRemoved,
    /// The wallet moved to a chain other than the required one.
    ChainChanged(ChainId),
    /// The wallet disconnected.
    Disconnected,
    /// A handshake could not put the wallet on the required chain.
    SwitchFailed,
    /// A handshake failed before the network check (rejected or no wallet).
    HandshakeFailed,
    /// Notifications were missed; state can no longer be trusted.
    MissedNotifications,
    /// The caller disconnected.
    Explicit,
}

/// Session transitions delivered to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Established { account: Address, chain_id: ChainId },
    AccountChanged(Address),
    Invalidated(InvalidationReason),
}

/// State shared with the notification listener.
struct SessionState {
    registry: ChainRegistry,
    current: ArcSwapOption<Session>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionState {
    fn notify(&self, event: SessionEvent) {
        // No observers is fine.
        let _ = self.events.send(event);
    }

    fn invalidate(&self, reason: InvalidationReason) {
        if self.current.swap(None).is_some() {
            tracing::info!(reason = ?reason, "Wallet session invalidated");
            self.notify(SessionEvent::Invalidated(reason));
        }
    }

    fn apply(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
                None => self.invalidate(InvalidationReason::AccountsRemoved),
                Some(&account) => {
                    let previous = self
                        .current
                        .rcu(|current| current.as_ref().map(|s| Arc::new(s.with_account(account))));
                    if let Some(previous) = previous {
                        if previous.account() != account {
                            tracing::info!(account = %account, "Active wallet account changed");
                            self.notify(SessionEvent::AccountChanged(account));
                        }
                    }
                }
            },
            ProviderEvent::ChainChanged(chain_id) => {
                let chain_id = ChainId(chain_id);
                if self.registry.is_required(chain_id) {
                    tracing::debug!(chain_id = %chain_id, "Wallet on required chain");
                } else {
                    self.invalidate(InvalidationReason::ChainChanged(chain_id));
                }
            }
            ProviderEvent::Disconnected => self.invalidate(InvalidationReason::Disconnected),
        }
    }
}

/// Owns the wallet session and its lifecycle.
pub struct SessionManager {
    provider: Option<Arc<dyn WalletProvider>>,
    state: Arc<SessionState>,
    handshake: tokio::sync::Mutex<()>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    /// Create a manager. `provider` is `None` when no wallet is installed.
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, registry: ChainRegistry) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            provider,
            state: Arc::new(SessionState {
                registry,
                current: ArcSwapOption::empty(),
                events,
            }),
            handshake: tokio::sync::Mutex::new(()),
            listener: Mutex::new(None),
        }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn required_network(&self) -> &NetworkDescriptor {
        self.state.registry.required_network()
    }

    /// The current session, if any.
    pub fn current(&self) -> Option<Arc<Session>> {
        self.state.current.load_full()
    }

    fn current_valid(&self) -> Option<Arc<Session>> {
        self.current()
            .filter(|s| self.state.registry.is_required(s.chain_id()))
    }

    /// Subscribe to session transitions.
    pub fn observe(&self) -> broadcast::Receiver<SessionEvent> {
        self.state.events.subscribe()
    }

    /// Return the valid session, performing the wallet handshake if needed.
    pub async fn ensure_session(&self) -> Result<Arc<Session>> {
        if let Some(session) = self.current_valid() {
            return Ok(session);
        }

        let provider = self.provider.clone().ok_or_else(|| {
            RandomnessError::WalletUnavailable("no wallet provider installed".to_string())
        })?;

        let _guard = self.handshake.lock().await;
        // Another caller may have finished the handshake while we waited.
        if let Some(session) = self.current_valid() {
            return Ok(session);
        }

        match self.handshake(provider).await {
            Ok(session) => {
                let session = Arc::new(session);
                self.state.current.store(Some(session.clone()));
                metrics::record_handshake("ok");
                tracing::info!(
                    account = %session.account(),
                    chain_id = %session.chain_id(),
                    "Wallet session established"
                );
                self.state.notify(SessionEvent::Established {
                    account: session.account(),
                    chain_id: session.chain_id(),
                });
                Ok(session)
            }
            Err(e) => {
                metrics::record_handshake(e.kind());
                tracing::warn!(error = %e, "Wallet handshake failed");
                self.state.invalidate(handshake_failure_reason(&e));
                Err(e)
            }
        }
    }

    async fn handshake(&self, provider: Arc<dyn WalletProvider>) -> Result<Session> {
        let required = self.state.registry.required_network();

        let accounts = provider
            .request_accounts()
            .await
            .map_err(classify_authorization_error)?;
        let account = *accounts.first().ok_or(RandomnessError::UserRejected)?;
        tracing::debug!(account = %account, "Wallet authorized");

        let chain_id = provider.chain_id().await.map_err(classify_chain_error)?;
        if chain_id != required.chain_id.0 {
            tracing::info!(
                current = chain_id,
                required = %required.chain_id,
                "Wallet on wrong network, switching"
            );
            self.switch_network(provider.as_ref(), required).await?;

            let confirmed = provider.chain_id().await.map_err(classify_chain_error)?;
            if confirmed != required.chain_id.0 {
                metrics::record_network_switch("mismatch");
                return Err(RandomnessError::NetworkSwitchFailed(format!(
                    "wallet reports chain {} after switching to {}",
                    confirmed, required.chain_id
                )));
            }
        }

        Ok(Session::new(provider, account, required.chain_id))
    }

    /// Switch, registering the network first if the wallet does not know it.
    async fn switch_network(&self, provider: &dyn WalletProvider, network: &NetworkDescriptor) -> Result<()> {
        let chain_id = network.chain_id.0;
        match provider.switch_chain(chain_id).await {
            Ok(()) => {
                metrics::record_network_switch("ok");
                Ok(())
            }
            Err(e) if e.is_unrecognized_chain() => {
                tracing::info!(
                    chain_id,
                    network = %network.display_name,
                    "Network unknown to wallet, registering"
                );
                provider.add_chain(network).await.map_err(|e| {
                    metrics::record_network_switch("register_failed");
                    RandomnessError::NetworkSwitchFailed(format!("registering network failed: {}", e))
                })?;
                provider.switch_chain(chain_id).await.map_err(|e| {
                    metrics::record_network_switch("failed");
                    RandomnessError::NetworkSwitchFailed(e.to_string())
                })?;
                metrics::record_network_switch("ok_after_register");
                Ok(())
            }
            Err(e) => {
                metrics::record_network_switch("failed");
                Err(RandomnessError::NetworkSwitchFailed(e.to_string()))
            }
        }
    }

    /// Apply a provider notification.
    pub fn handle_event(&self, event: ProviderEvent) {
        self.state.apply(event);
    }

    /// Drop the current session.
    pub fn disconnect(&self) {
        self.state.invalidate(InvalidationReason::Explicit);
    }

    /// Start listening to provider notifications.
    ///
    /// Returns false if already listening or there is no provider.
    pub fn mount(&self) -> bool {
        let Some(provider) = &self.provider else {
            return false;
        };
        let mut listener = self.listener.lock().unwrap_or_else(|e| e.into_inner());
        if listener.as_ref().is_some_and(|h| !h.is_finished()) {
            return false;
        }

        let mut rx = provider.subscribe();
        let state = self.state.clone();
        *listener = Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => state.apply(event),
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Missed wallet notifications");
                        state.invalidate(InvalidationReason::MissedNotifications);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));
        tracing::debug!("Wallet notification listener mounted");
        true
    }

    /// Stop listening to provider notifications.
    pub fn unmount(&self) {
        let handle = self.listener.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            handle.abort();
            tracing::debug!("Wallet notification listener unmounted");
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn handshake_failure_reason(e: &RandomnessError) -> InvalidationReason {
    match e {
        RandomnessError::NetworkSwitchFailed(_) => InvalidationReason::SwitchFailed,
        _ => InvalidationReason::HandshakeFailed,
    }
}

fn classify_authorization_error(e: ProviderError) -> RandomnessError {
    if e.is_user_rejected() {
        RandomnessError::UserRejected
    } else {
        RandomnessError::WalletUnavailable(e.to_string())
    }
}

fn classify_chain_error(e: ProviderError) -> RandomnessError {
    if e.is_unavailable() {
        RandomnessError::WalletUnavailable(e.to_string())
    } else {
        RandomnessError::NetworkSwitchFailed(e.to_string())
    }
}
