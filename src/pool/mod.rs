//! Fleet-control subsystem.
//!
//! # Data Flow
//! ```text
//! health/gate.rs, resilience/blacklist.rs, lifecycle/scale.rs
//!     → client.rs (PoolControl trait, one HTTP call per operation)
//!     → fleet-control API (/scraper/project, /scraper/project/connectors, ...)
//!     → model.rs (ProjectView, ConnectorView, ProxyRecord)
//!     → PoolSnapshot (derived counts, owned by the admission gate)
//! ```
//!
//! # Design Decisions
//! - The client is a trait seam so tests run against an in-memory fleet
//! - Failures surface as PoolError and are never retried here

pub mod client;
pub mod model;
pub mod types;

pub use client::{PoolControl, ScrapoxyClient};
pub use model::{
    ConnectorInfo, ConnectorView, PoolSnapshot, ProjectMode, ProjectStatus, ProjectView,
    ProxyRecord, ProxyStatus, ProxyToRemove,
};
pub use types::{PoolError, PoolResult};
