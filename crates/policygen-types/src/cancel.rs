//! Cooperative cancellation.
//!
//! One [`CancelToken`] is created per top-level invocation and cloned into
//! every stage. Setting it never interrupts work directly; each stage checks
//! it at its own suspension points and unwinds with [`Cancelled`].

use std::sync::Arc;

use tokio::sync::watch;

/// Marker error returned when a stage observes cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Operation cancelled")]
pub struct Cancelled;

/// Shared cancellation flag.
#[derive(Debug, Clone)]
pub struct CancelToken {
    state: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// Fail with [`Cancelled`] if cancellation has been requested.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolve once cancellation has been requested.
    pub async fn cancelled(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
