//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Response (x-scrapoxy-proxyname: p1)
//!     → callback produces follow-up requests and items
//!     → sticky.rs stamps affinity "p1" on each follow-up request
//!     → WorkItem::routing_headers() sends it back to the transparent proxy
//!     → same backing proxy serves the follow-up
//! ```
//!
//! # Design Decisions
//! - Affinity lives on the work item, not in shared state
//! - Deterministic: same response always stamps the same token

pub mod sticky;

pub use sticky::{Output, StickyPropagator};
