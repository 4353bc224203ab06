//! Shutdown coordination for the routing core.
//!
//! State machine: `Running → Draining → Terminated`. The first
//! termination signal starts draining and arms the grace timer; a
//! second signal while draining is a no-op. If the grace timer fires
//! before the listener finishes draining, termination is forced.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;

/// Lifecycle phase of the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    Draining,
    Terminated,
}

/// How draining ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The listener reported all connections closed in time.
    Graceful,
    /// The grace timer fired first; outstanding connections were cut.
    Forced,
}

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks (probe
/// loops, the affinity reset timer) subscribe to.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    tx: broadcast::Sender<()>,
    state: Mutex<ShutdownState>,
    grace_period: Duration,
}

impl ShutdownCoordinator {
    pub fn new(grace_period: Duration) -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            state: Mutex::new(ShutdownState::Running),
            grace_period,
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn state(&self) -> ShutdownState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle a termination signal. The first call transitions to
    /// Draining and broadcasts; repeat calls return false and do
    /// nothing.
    pub fn begin(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != ShutdownState::Running {
            tracing::debug!("shutdown already in progress");
            return false;
        }
        *state = ShutdownState::Draining;
        drop(state);

        tracing::info!(grace_ms = self.grace_period.as_millis() as u64, "shutdown requested, draining");
        let _ = self.tx.send(());
        true
    }

    /// Wait for the listener's drain future, bounded by the grace
    /// period. Transitions to Terminated either way.
    pub async fn drain(&self, connections_closed: impl Future<Output = ()>) -> DrainOutcome {
        let outcome = tokio::select! {
            _ = connections_closed => DrainOutcome::Graceful,
            _ = tokio::time::sleep(self.grace_period) => DrainOutcome::Forced,
        };

        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = ShutdownState::Terminated;

        match outcome {
            DrainOutcome::Graceful => tracing::info!("drained cleanly, terminated"),
            DrainOutcome::Forced => tracing::warn!(
                grace_ms = self.grace_period.as_millis() as u64,
                "grace period expired, forcing termination"
            ),
        }
        outcome
    }
}
