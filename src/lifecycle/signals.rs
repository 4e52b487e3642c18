//! OS signal handling.
//!
//! Ctrl-C cancels pending waits. A transaction already handed to the
//! wallet is not affected; only the local wait stops.

use std::sync::Arc;

use crate::lifecycle::cancel::Cancellation;

/// Spawn a task that triggers `cancellation` on the first Ctrl-C.
pub fn cancel_on_interrupt(cancellation: Arc<Cancellation>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("Interrupt received, cancelling pending wait");
                cancellation.cancel();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for interrupt signal"),
        }
    })
}
