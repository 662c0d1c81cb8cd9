//! Blacklist detection and recovery.
//!
//! # Responsibilities
//! - Recognise responses whose status means the serving proxy is blacklisted
//! - Ask the fleet to remove that proxy and invalidate the pool snapshot
//! - Replay the request after a jittered delay, or abandon it past `retry_max`
//!
//! # Design Decisions
//! - A missing proxy-name header is an environment error, never a pass-through
//! - Fleet failures propagate; the detector does not guess pool state
//! - `retry_max = 0` gives fail-on-first-blacklist without a separate path

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::validation::validate_blacklist;
use crate::config::{BlacklistConfig, ConfigError, GateConfig};
use crate::health::SnapshotCache;
use crate::observability::metrics;
use crate::pipeline::{Response, WorkItem, PROXYNAME_HEADER};
use crate::pool::{PoolControl, PoolError, ProxyToRemove};
use crate::resilience::backoff::jittered_delay;
use crate::resilience::retries::{RetryScheduler, RetryTicket};

/// Errors raised while handling a blacklisted response.
#[derive(Debug, Error)]
pub enum BlacklistError {
    /// Blacklisted status without the proxy-name header: transparent
    /// interception is not enabled on the fleet.
    #[error("no '{header}' header on HTTP {status} response for {url}; MITM must be enabled", header = PROXYNAME_HEADER)]
    MissingProxyHeader { status: u16, url: String },

    /// Removal call failed.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// What the pipeline should do with a response.
#[derive(Debug)]
pub enum Verdict {
    /// Not blacklisted; continue with the response.
    PassThrough(Response),

    /// Dispatch this replay immediately (zero delay drawn).
    Replay(WorkItem),

    /// Replay armed on the retry scheduler; it arrives on the retry channel.
    Scheduled(RetryTicket),

    /// Retries exhausted. The item will not be replayed.
    Abandoned {
        item: WorkItem,
        proxy_id: String,
        status: u16,
    },
}

pub struct FailureDetector {
    client: Arc<dyn PoolControl>,
    cache: Arc<SnapshotCache>,
    scheduler: Arc<RetryScheduler>,
    config: BlacklistConfig,
    abandoned: AtomicU64,
}

impl FailureDetector {
    /// Create a detector. Fails on an invalid blacklist section, or when
    /// removal is enabled without the admission gate.
    pub fn new(
        client: Arc<dyn PoolControl>,
        cache: Arc<SnapshotCache>,
        scheduler: Arc<RetryScheduler>,
        config: BlacklistConfig,
        gate: &GateConfig,
    ) -> Result<Self, ConfigError> {
        validate_blacklist(&config, gate)?;
        Ok(Self {
            client,
            cache,
            scheduler,
            config,
            abandoned: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &BlacklistConfig {
        &self.config
    }

    /// Items abandoned after exhausting their retries.
    pub fn abandoned_count(&self) -> u64 {
        self.abandoned.load(Ordering::Relaxed)
    }

    pub fn is_blacklisted(&self, status: u16) -> bool {
        self.config.enabled && self.config.http_status_codes.contains(&status)
    }

    /// Inspect the response to `item`.
    pub async fn on_response(
        &self,
        item: &WorkItem,
        response: Response,
    ) -> Result<Verdict, BlacklistError> {
        if !self.is_blacklisted(response.status) {
            return Ok(Verdict::PassThrough(response));
        }

        let status = response.status;
        let proxy_id = match response.proxy_name() {
            Some(name) => name.to_string(),
            None => {
                return Err(BlacklistError::MissingProxyHeader {
                    status,
                    url: response.url,
                })
            }
        };

        metrics::record_blacklist(status);
        tracing::info!(
            proxy_id = %proxy_id,
            url = %response.url,
            status,
            "Removing blacklisted proxy"
        );

        let removal = self
            .client
            .ask_proxies_to_remove(&[ProxyToRemove {
                id: proxy_id.clone(),
                force: self.config.force,
            }])
            .await;
        // the proxy is suspect whether or not the fleet accepted the removal
        self.cache.invalidate();
        removal?;
        metrics::record_proxy_removal();

        Ok(self.decide_retry(item, proxy_id, status))
    }

    fn decide_retry(&self, item: &WorkItem, proxy_id: String, status: u16) -> Verdict {
        if item.retry_count >= self.config.retry_max {
            self.abandoned.fetch_add(1, Ordering::Relaxed);
            metrics::record_retry_abandoned();
            tracing::warn!(
                url = %item.url,
                status,
                retry_count = item.retry_count,
                "Abandoning blacklisted request after too many retries"
            );
            return Verdict::Abandoned {
                item: item.clone(),
                proxy_id,
                status,
            };
        }

        let mut replay = item.clone();
        replay.retry_count += 1;
        replay.dont_filter = true;
        // the removed proxy cannot serve the replay
        if replay.affinity.as_deref() == Some(proxy_id.as_str()) {
            replay.affinity = None;
        }

        let delay = jittered_delay(&self.config.sleep);
        if delay.is_zero() {
            replay.delay_until = None;
            return Verdict::Replay(replay);
        }

        tracing::info!(
            url = %item.url,
            delay_secs = delay.as_secs(),
            retry_count = replay.retry_count,
            "Delaying replay of blacklisted request"
        );
        replay.delay_until = Some(Instant::now() + delay);
        Verdict::Scheduled(self.scheduler.schedule(replay, delay))
    }
}
