//! Fleet warm-up and cool-down around a job.
//!
//! Start switches the project to HOT and then waits a fixed warm-up before
//! work may begin. There is no readiness polling: the admission gate already
//! holds dispatch while the pool is empty.

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::ScaleConfig;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::pool::{PoolControl, PoolResult, ProjectMode};

pub struct ScaleController {
    client: Arc<dyn PoolControl>,
    config: ScaleConfig,
    shutdown: Shutdown,
}

impl ScaleController {
    pub fn new(client: Arc<dyn PoolControl>, config: ScaleConfig, shutdown: &Shutdown) -> Self {
        Self {
            client,
            config,
            shutdown: shutdown.clone(),
        }
    }

    pub fn config(&self) -> &ScaleConfig {
        &self.config
    }

    /// Request HOT, then block for the warm-up delay.
    ///
    /// The wait ends early if shutdown is triggered.
    pub async fn on_start(&self) -> PoolResult<()> {
        tracing::info!(warmup_secs = self.config.warmup_secs, "Scaling fleet up");
        self.client.set_project_status(ProjectMode::Hot).await?;
        metrics::record_mode_change(ProjectMode::Hot.as_str());

        let mut shutdown_rx = self.shutdown.subscribe();
        if self.shutdown.is_triggered() {
            return Ok(());
        }
        tokio::select! {
            _ = tokio::time::sleep(self.config.warmup()) => {
                tracing::info!("Warm-up delay elapsed");
            }
            _ = shutdown_rx.recv() => {
                tracing::info!("Warm-up interrupted by shutdown");
            }
        }
        Ok(())
    }

    /// Request OFF without waiting for the answer.
    ///
    /// The returned handle resolves once the request finished; failures are
    /// logged, not returned.
    pub fn on_stop(&self) -> JoinHandle<()> {
        let client = self.client.clone();
        tracing::info!("Scaling fleet down");
        tokio::spawn(async move {
            match client.set_project_status(ProjectMode::Off).await {
                Ok(()) => metrics::record_mode_change(ProjectMode::Off.as_str()),
                Err(e) => tracing::error!(error = %e, "Failed to switch fleet off"),
            }
        })
    }
}
