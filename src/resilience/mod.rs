//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Response from the pipeline:
//!     → blacklist.rs (status in blacklist set?)
//!     → pool::PoolControl::ask_proxies_to_remove + health::SnapshotCache::invalidate
//!     → backoff.rs (uniform delay in [sleep_min, sleep_max])
//!     → retries.rs (timer, then re-submit on the retry channel)
//!       or terminal Abandoned verdict once retry_max is reached
//! ```
//!
//! # Design Decisions
//! - Jitter spreads replays of requests blacklisted together
//! - Retry timers never hold a pipeline slot and die with shutdown
//! - Abandoned items are returned and counted, never silently dropped

pub mod backoff;
pub mod blacklist;
pub mod retries;

pub use blacklist::{BlacklistError, FailureDetector, Verdict};
pub use retries::{RetryScheduler, RetryTicket};
