//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for termination signals (SIGTERM, SIGINT/Ctrl+C)
//! - Translate them into the shutdown coordinator's trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Repeat signals while draining are absorbed by the coordinator's
//!   idempotent `begin`

use std::future::Future;

use crate::lifecycle::shutdown::ShutdownCoordinator;

/// Begin shutdown when the trigger future resolves.
pub async fn begin_on(trigger: impl Future<Output = ()>, coordinator: &ShutdownCoordinator) {
    trigger.await;
    coordinator.begin();
}

/// Wait for SIGTERM or Ctrl+C, then begin shutdown. Intended to be
/// spawned by the embedding server alongside its listener.
pub async fn shutdown_on_signal(coordinator: &ShutdownCoordinator) {
    begin_on(wait_for_signal(), coordinator).await;
}

/// Wait for the first termination signal.
pub async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut term =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("termination signal received");
}
