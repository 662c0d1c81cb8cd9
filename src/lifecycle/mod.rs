//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Job start (scale.rs, health/gate.rs):
//!     Request HOT → fixed warm-up wait → request start mode → dispatch begins
//!
//! Job stop:
//!     Cancel pending retries → request stop mode → request OFF (not awaited)
//!
//! Signals (signals.rs):
//!     SIGINT → Trigger graceful shutdown (shutdown.rs)
//! ```
//!
//! # Design Decisions
//! - Shutdown is a broadcast every timer selects on; nothing fires after it
//! - Warm-up is a blunt fixed wait, interruptible by shutdown

pub mod scale;
pub mod shutdown;
pub mod signals;

pub use scale::ScaleController;
pub use shutdown::Shutdown;
