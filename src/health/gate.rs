//! Admission gate.
//!
//! # Responsibilities
//! - Decide, for each pull of the next work item, whether dispatch may proceed
//! - Keep the pool snapshot fresh without fetching on every call
//! - Ask the fleet for the restart mode while no proxy is usable
//! - Request the configured modes when the job starts and ends

use std::sync::Arc;
use tokio::time::Instant;

use crate::config::validation::validate_gate;
use crate::config::{ConfigError, GateConfig};
use crate::health::snapshot::{RefreshGuard, SnapshotCache};
use crate::observability::metrics;
use crate::pipeline::WorkSource;
use crate::pool::{PoolControl, PoolResult, PoolSnapshot, ProjectMode};

pub struct AdmissionGate {
    client: Arc<dyn PoolControl>,
    cache: Arc<SnapshotCache>,
    config: GateConfig,
}

impl AdmissionGate {
    /// Create a gate over `cache`. Fails on an invalid gate section.
    pub fn new(
        client: Arc<dyn PoolControl>,
        cache: Arc<SnapshotCache>,
        config: GateConfig,
    ) -> Result<Self, ConfigError> {
        validate_gate(&config)?;
        Ok(Self {
            client,
            cache,
            config,
        })
    }

    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Pull the next item from `source` if the pool has a usable proxy.
    ///
    /// Returns `Ok(None)` without touching `source` while the pool is empty.
    pub async fn try_advance<S: WorkSource>(&self, source: &mut S) -> PoolResult<Option<S::Item>> {
        if !self.config.enabled {
            return Ok(source.next_item());
        }

        self.refresh_if_stale().await?;

        if self.cache.proxies_usable() == 0 {
            tracing::debug!("No usable proxy, holding dispatch");
            metrics::record_gate_decision(false);
            return Ok(None);
        }

        metrics::record_gate_decision(true);
        Ok(source.next_item())
    }

    /// Refresh the snapshot if it is absent or stale.
    ///
    /// Returns whether this call performed the fetch. A call that finds
    /// another refresh in progress does nothing.
    pub async fn refresh_if_stale(&self) -> PoolResult<bool> {
        if !self
            .cache
            .needs_refresh(Instant::now(), self.config.refresh_interval())
        {
            return Ok(false);
        }

        let Some(guard) = self.cache.try_begin_refresh() else {
            tracing::debug!("Pool refresh already in progress");
            return Ok(false);
        };

        self.refresh_with(guard).await?;
        Ok(true)
    }

    async fn refresh_with(&self, guard: RefreshGuard<'_>) -> PoolResult<()> {
        let views = match self.client.get_all_connectors_and_proxies().await {
            Ok(views) => views,
            Err(e) => {
                metrics::record_refresh(false);
                tracing::warn!(error = %e, "Pool refresh failed");
                return Err(e);
            }
        };

        let snapshot = PoolSnapshot::from_views(&views, Instant::now());
        let connectors_active = snapshot.connectors_active;
        let proxies_usable = snapshot.proxies_usable;

        metrics::record_refresh(true);

        // a discarded listing says nothing about the current pool
        if !guard.publish(snapshot) {
            return Ok(());
        }

        metrics::record_snapshot(connectors_active, proxies_usable);
        tracing::debug!(
            connectors_active,
            proxies_usable,
            "Pool snapshot refreshed"
        );

        if proxies_usable == 0 {
            self.on_empty_pool(connectors_active).await?;
        }
        Ok(())
    }

    async fn on_empty_pool(&self, connectors_active: usize) -> PoolResult<()> {
        if connectors_active == 0 {
            tracing::warn!("No proxy online and no connector active");
        } else {
            tracing::warn!(connectors_active, "No proxy online");
        }

        let Some(restart) = self.config.mode_restart else {
            return Ok(());
        };

        let project = self.client.get_project().await?;
        if project.status != restart {
            tracing::info!(
                current = %project.status,
                target = %restart,
                "Invalid project mode, requesting restart mode"
            );
            self.request_mode(restart).await?;
        }
        Ok(())
    }

    async fn request_mode(&self, mode: ProjectMode) -> PoolResult<()> {
        self.client.set_project_status(mode).await?;
        metrics::record_mode_change(mode.as_str());
        Ok(())
    }

    /// Request the start mode, if configured. Does not wait for readiness.
    pub async fn on_job_start(&self) -> PoolResult<()> {
        if let Some(mode) = self.config.mode_start {
            tracing::info!(mode = %mode, "Changing project mode for job start");
            self.request_mode(mode).await?;
        }
        Ok(())
    }

    /// Request the stop mode, if configured.
    pub async fn on_job_end(&self) -> PoolResult<()> {
        if let Some(mode) = self.config.mode_stop {
            tracing::info!(mode = %mode, "Changing project mode for job end");
            self.request_mode(mode).await?;
        }
        Ok(())
    }
}
