//! Delayed re-submission of work items.
//!
//! # Responsibilities
//! - Hold a replayed item for its delay without occupying a pipeline slot
//! - Deliver due items on a channel the pipeline drains
//! - Cancel pending timers individually, all at once, or on shutdown
//!
//! # Design Decisions
//! - One spawned task per pending retry, tracked by abort handle
//! - Nothing fires once shutdown has been triggered or the scheduler dropped

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;

use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::pipeline::WorkItem;

/// Receipt for a scheduled retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryTicket {
    pub id: u64,
    pub due_in: Duration,
}

/// Timer-based retry queue.
pub struct RetryScheduler {
    tx: mpsc::UnboundedSender<WorkItem>,
    pending: Arc<DashMap<u64, AbortHandle>>,
    next_id: AtomicU64,
    shutdown: Shutdown,
}

impl RetryScheduler {
    /// Create a scheduler bound to `shutdown`.
    ///
    /// Returns the scheduler and the receiver on which due items arrive.
    pub fn new(shutdown: &Shutdown) -> (Self, mpsc::UnboundedReceiver<WorkItem>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                pending: Arc::new(DashMap::new()),
                next_id: AtomicU64::new(1),
                shutdown: shutdown.clone(),
            },
            rx,
        )
    }

    /// Deliver `item` after `delay`. Must be called within a Tokio runtime.
    ///
    /// After shutdown the ticket is returned but no timer is armed.
    pub fn schedule(&self, item: WorkItem, delay: Duration) -> RetryTicket {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let ticket = RetryTicket { id, due_in: delay };

        // subscribe before reading the flag so a concurrent trigger is not missed
        let mut shutdown_rx = self.shutdown.subscribe();
        if self.shutdown.is_triggered() {
            tracing::debug!(retry_id = id, url = %item.url, "Shutting down, retry not armed");
            return ticket;
        }

        let tx = self.tx.clone();
        let pending = self.pending.clone();
        let (registered_tx, registered_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            // the entry must exist before this task can remove it
            if registered_rx.await.is_err() {
                return;
            }
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    pending.remove(&id);
                    tracing::debug!(retry_id = id, url = %item.url, "Retry due, re-submitting");
                    if tx.send(item).is_err() {
                        tracing::warn!(retry_id = id, "Retry receiver dropped, item lost");
                    }
                }
                _ = shutdown_rx.recv() => {
                    pending.remove(&id);
                    tracing::debug!(retry_id = id, "Pending retry dropped at shutdown");
                }
            }
        });

        self.pending.insert(id, handle.abort_handle());
        let _ = registered_tx.send(());

        metrics::record_retry_scheduled();
        ticket
    }

    /// Cancel one pending retry. Returns false if it already fired or is unknown.
    pub fn cancel(&self, id: u64) -> bool {
        match self.pending.remove(&id) {
            Some((_, handle)) => {
                handle.abort();
                metrics::record_retry_cancelled(1);
                true
            }
            None => false,
        }
    }

    /// Cancel every pending retry. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<u64> = self.pending.iter().map(|entry| *entry.key()).collect();
        let cancelled = ids.into_iter().filter(|id| self.cancel(*id)).count();
        if cancelled > 0 {
            tracing::info!(cancelled, "Cancelled pending retries");
        }
        cancelled
    }

    /// Number of retries waiting for their delay.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for RetryScheduler {
    fn drop(&mut self) {
        for entry in self.pending.iter() {
            entry.value().abort();
        }
    }
}
