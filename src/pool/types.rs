//! Error definitions for fleet-control calls.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors from the fleet-control API.
///
/// None of these are retried by the pipeline; callers decide whether to
/// abort the job or carry on degraded.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Connection, timeout or body transfer failure.
    #[error("fleet API transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Credentials rejected.
    #[error("fleet API rejected credentials (HTTP {status})")]
    Unauthorized { status: u16 },

    /// Any other non-success answer.
    #[error("fleet API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Base URL could not be combined with an endpoint path.
    #[error("invalid fleet API URL: {0}")]
    InvalidUrl(String),

    /// The `[api]` section is unusable (missing credentials, bad URL).
    #[error("invalid fleet API configuration: {0}")]
    Config(#[from] ConfigError),

    /// Response body did not match the expected shape.
    #[error("cannot decode fleet API response: {0}")]
    Decode(String),
}

/// Result type for fleet-control operations.
pub type PoolResult<T> = Result<T, PoolError>;
