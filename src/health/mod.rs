//! Pool health subsystem.
//!
//! # Data Flow
//! ```text
//! Admission (gate.rs):
//!     Pipeline asks for next item
//!     → snapshot stale? fetch connectors via pool::PoolControl
//!     → publish into snapshot.rs
//!     → usable proxies? delegate to WorkSource : hold dispatch
//!
//! Invalidation (snapshot.rs):
//!     resilience/blacklist.rs removes a proxy   ┐
//!     exhaustion.rs sees a no_proxy signal      ┘→ drop snapshot
//!     → next admission forces a fetch
//! ```
//!
//! # Design Decisions
//! - The snapshot is the only state shared between components
//! - One refresh at a time; losers of the race reuse whatever is published
//! - An empty pool is a gating decision, not an error

pub mod exhaustion;
pub mod gate;
pub mod snapshot;

pub use exhaustion::ExhaustionHook;
pub use gate::AdmissionGate;
pub use snapshot::SnapshotCache;
