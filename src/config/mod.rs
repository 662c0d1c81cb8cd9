//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → PipelineConfig (validated, immutable)
//!     → sections handed to each component constructor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; checked once, before any component exists
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ApiConfig, BlacklistConfig, DelayRange, GateConfig, ObservabilityConfig, PipelineConfig,
    ScaleConfig,
};
