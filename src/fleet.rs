//! Wiring of the pool-aware components around one crawl job.
//!
//! # Data Flow
//! ```text
//! Fleet::from_config
//!     → SnapshotCache (shared)
//!         ├── AdmissionGate   (reads, refreshes)
//!         ├── FailureDetector (invalidates on removal)
//!         └── ExhaustionHook  (invalidates on 557 / no_proxy)
//!     → RetryScheduler → retry receiver drained by the crawler
//!     → ScaleController (only when scale.enabled)
//! ```
//!
//! The crawler owns the work source and the HTTP transport; the fleet only
//! answers "may I dispatch?" and "what now with this response?".

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{ConfigError, PipelineConfig};
use crate::health::{AdmissionGate, ExhaustionHook, SnapshotCache};
use crate::lifecycle::{ScaleController, Shutdown};
use crate::pipeline::{Response, WorkItem, WorkSource};
use crate::pool::{PoolControl, PoolResult};
use crate::resilience::{BlacklistError, FailureDetector, RetryScheduler, Verdict};
use crate::routing::{Output, StickyPropagator};

pub struct Fleet {
    cache: Arc<SnapshotCache>,
    gate: AdmissionGate,
    detector: FailureDetector,
    exhaustion: ExhaustionHook,
    sticky: StickyPropagator,
    scheduler: Arc<RetryScheduler>,
    scale: Option<ScaleController>,
    retries: Option<mpsc::UnboundedReceiver<WorkItem>>,
    shutdown: Shutdown,
}

impl Fleet {
    /// Build every component around `client`.
    ///
    /// Each component validates its own section. `[api]` is validated by
    /// [`ScrapoxyClient::new`](crate::pool::ScrapoxyClient::new), since the
    /// client is injected here.
    pub fn from_config(
        config: &PipelineConfig,
        client: Arc<dyn PoolControl>,
    ) -> Result<Self, ConfigError> {
        let shutdown = Shutdown::new();
        let cache = Arc::new(SnapshotCache::new());
        let (scheduler, retries) = RetryScheduler::new(&shutdown);
        let scheduler = Arc::new(scheduler);

        let gate = AdmissionGate::new(client.clone(), cache.clone(), config.gate.clone())?;
        let detector = FailureDetector::new(
            client.clone(),
            cache.clone(),
            scheduler.clone(),
            config.blacklist.clone(),
            &config.gate,
        )?;
        let scale = config
            .scale
            .enabled
            .then(|| ScaleController::new(client, config.scale.clone(), &shutdown));

        Ok(Self {
            exhaustion: ExhaustionHook::new(cache.clone()),
            sticky: StickyPropagator::new(),
            cache,
            gate,
            detector,
            scheduler,
            scale,
            retries: Some(retries),
            shutdown,
        })
    }

    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn detector(&self) -> &FailureDetector {
        &self.detector
    }

    pub fn exhaustion(&self) -> &ExhaustionHook {
        &self.exhaustion
    }

    pub fn scheduler(&self) -> &Arc<RetryScheduler> {
        &self.scheduler
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Take the receiver on which delayed replays arrive. Only the first
    /// call returns it.
    pub fn take_retries(&mut self) -> Option<mpsc::UnboundedReceiver<WorkItem>> {
        self.retries.take()
    }

    /// Job start: warm the fleet up (if scaling is enabled), then request the
    /// gate's start mode.
    pub async fn start(&self) -> PoolResult<()> {
        if let Some(scale) = &self.scale {
            scale.on_start().await?;
        }
        self.gate.on_job_start().await
    }

    /// Pull the next item through the admission gate.
    pub async fn next<S: WorkSource>(&self, source: &mut S) -> PoolResult<Option<S::Item>> {
        self.gate.try_advance(source).await
    }

    /// Classify a response to `item`.
    ///
    /// Exhaustion is checked first, so a 557 invalidates the snapshot even if
    /// 557 is not in the blacklist set.
    pub async fn on_response(
        &self,
        item: &WorkItem,
        response: Response,
    ) -> Result<Verdict, BlacklistError> {
        self.exhaustion.on_response(&response);
        self.detector.on_response(item, response).await
    }

    /// Stamp the response's proxy on the requests its callback produced.
    pub fn on_output(&self, response: &Response, outputs: Vec<Output>) -> Vec<Output> {
        self.sticky.on_output(response, outputs)
    }

    /// Job end: drop pending retries, request the stop mode, switch the
    /// fleet off (if scaling is enabled) and signal shutdown.
    ///
    /// Returns the handle of the OFF request, which runs in the background;
    /// await it before exiting the process to be sure it was sent. Shutdown
    /// is always triggered. If the stop mode fails, that error is returned and
    /// the OFF request still runs detached.
    pub async fn stop(&self) -> PoolResult<Option<JoinHandle<()>>> {
        self.scheduler.cancel_all();
        let result = self.gate.on_job_end().await;
        let scale_off = self.scale.as_ref().map(ScaleController::on_stop);
        self.shutdown.trigger();
        result.map(|()| scale_off)
    }
}
