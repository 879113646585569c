//! OS signal handling.
//!
//! The first SIGINT/SIGTERM triggers a graceful shutdown; a second one
//! exits the process.

use std::sync::Arc;

use crate::lifecycle::Shutdown;

/// Spawn a task translating OS signals into `shutdown` triggers.
pub fn spawn_signal_handler(shutdown: Arc<Shutdown>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(e) = wait_for_signal().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signals");
                return;
            }

            if shutdown.trigger() {
                tracing::warn!("Second shutdown signal received, exiting");
                std::process::exit(130);
            }
            tracing::info!("Shutdown signal received; submitted transactions are unaffected");
        }
    })
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
