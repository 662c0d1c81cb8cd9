//! Host pipeline surface.
//!
//! The crawl pipeline itself (network I/O, parsing) lives outside this crate.
//! These types are what the pool-aware components exchange with it.
//!
//! # Data Flow
//! ```text
//! queue.rs (WorkSource) → health/gate.rs decides → host dispatches WorkItem
//!     → Response → health/exhaustion.rs, resilience/blacklist.rs
//!     → derived WorkItems → routing/sticky.rs → queue.rs
//! ```

pub mod queue;
pub mod request;
pub mod response;

pub use queue::{MemoryQueue, WorkSource};
pub use request::WorkItem;
pub use response::Response;

/// Header set by the transparent proxy naming the instance that served a
/// response, and read by it to route a request to a given instance.
pub const PROXYNAME_HEADER: &str = "x-scrapoxy-proxyname";
