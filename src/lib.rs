//! Pool-aware crawl pipeline for a Scrapoxy proxy fleet.

// Fleet state
pub mod config;
pub mod pool;

// Crawl-side hooks
pub mod health;
pub mod pipeline;
pub mod resilience;
pub mod routing;

// Cross-cutting concerns
pub mod fleet;
pub mod lifecycle;
pub mod observability;

pub use config::PipelineConfig;
pub use fleet::Fleet;
pub use lifecycle::Shutdown;
