//! Shared pool snapshot with single-flight refresh and invalidation.
//!
//! # States
//! - Empty: never fetched, or invalidated since the last fetch
//! - Fresh: captured less than one refresh interval ago
//! - Stale: older than the refresh interval
//!
//! # Invariants
//! - The snapshot is swapped whole; readers never see a partial update
//! - At most one refresh holds the [`RefreshGuard`] at a time
//! - A refresh that started before an invalidation cannot publish its result

use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::pool::PoolSnapshot;

/// Holder of the most recent [`PoolSnapshot`].
#[derive(Debug, Default)]
pub struct SnapshotCache {
    current: ArcSwapOption<PoolSnapshot>,
    refreshing: AtomicBool,
    generation: AtomicU64,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, if any.
    pub fn load(&self) -> Option<Arc<PoolSnapshot>> {
        self.current.load_full()
    }

    /// Usable proxy count, zero when there is no snapshot.
    pub fn proxies_usable(&self) -> usize {
        self.load().map(|s| s.proxies_usable).unwrap_or(0)
    }

    /// True when the snapshot is absent or older than `interval`.
    pub fn needs_refresh(&self, now: Instant, interval: Duration) -> bool {
        match self.load() {
            Some(snapshot) => snapshot.is_stale(now, interval),
            None => true,
        }
    }

    /// Drop the snapshot so the next read forces a fetch.
    ///
    /// Invalidating an already empty cache only bumps the generation.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if self.current.swap(None).is_some() {
            tracing::debug!("Pool snapshot invalidated");
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Claim the refresh slot. `None` if another refresh is in progress.
    pub fn try_begin_refresh(&self) -> Option<RefreshGuard<'_>> {
        self.refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshGuard {
                cache: self,
                generation: self.generation(),
            })
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }
}

/// Exclusive right to publish the next snapshot. Released on drop.
#[derive(Debug)]
pub struct RefreshGuard<'a> {
    cache: &'a SnapshotCache,
    generation: u64,
}

impl RefreshGuard<'_> {
    /// Publish `snapshot` unless the cache was invalidated since this
    /// refresh began. Returns whether it was stored.
    pub fn publish(self, snapshot: PoolSnapshot) -> bool {
        if self.cache.generation() != self.generation {
            tracing::debug!("Discarding snapshot fetched before an invalidation");
            return false;
        }
        self.cache.current.store(Some(Arc::new(snapshot)));
        true
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.cache.refreshing.store(false, Ordering::Release);
    }
}
