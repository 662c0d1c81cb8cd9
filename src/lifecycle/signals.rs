//! OS signal handling.

use crate::lifecycle::Shutdown;

/// Wait for Ctrl+C, then trigger `shutdown`.
///
/// Returns early without triggering if `shutdown` fires first.
pub async fn shutdown_on_ctrl_c(shutdown: Shutdown) {
    let mut rx = shutdown.subscribe();
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            match res {
                Ok(()) => tracing::info!("Shutdown signal received"),
                Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C, shutting down"),
            }
            shutdown.trigger();
        }
        _ = rx.recv() => {}
    }
}
