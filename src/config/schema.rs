//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the pipeline.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::pool::ProjectMode;

/// Root configuration for the pool-aware pipeline.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fleet-control API endpoint and credentials.
    pub api: ApiConfig,

    /// Admission gate settings.
    pub gate: GateConfig,

    /// Blacklist detection and retry settings.
    pub blacklist: BlacklistConfig,

    /// Warm-up/cool-down around the job.
    pub scale: ScaleConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Fleet-control API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the API (e.g., "http://localhost:8890/api").
    pub url: String,

    /// Project username.
    pub username: String,

    /// Project password.
    pub password: String,

    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8890/api".to_string(),
            username: String::new(),
            password: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Admission gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GateConfig {
    /// Gate dispatch on pool health.
    pub enabled: bool,

    /// Mode requested when the job starts.
    pub mode_start: Option<ProjectMode>,

    /// Mode requested while the pool has no usable proxy.
    pub mode_restart: Option<ProjectMode>,

    /// Mode requested when the job ends.
    pub mode_stop: Option<ProjectMode>,

    /// Seconds before a pool snapshot is considered stale.
    pub refresh_interval_secs: u64,
}

impl GateConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode_start: None,
            mode_restart: None,
            mode_stop: None,
            refresh_interval_secs: 10,
        }
    }
}

/// Inclusive range of seconds a blacklisted request waits before replay.
///
/// Written either as `[min, max]` or as a single number meaning `[n, n]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "SleepSetting", into = "[u64; 2]")]
pub struct DelayRange {
    pub min_secs: u64,
    pub max_secs: u64,
}

impl DelayRange {
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self { min_secs, max_secs }
    }

    pub fn fixed(secs: u64) -> Self {
        Self::new(secs, secs)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SleepSetting {
    Fixed(u64),
    Range([u64; 2]),
}

impl From<SleepSetting> for DelayRange {
    fn from(setting: SleepSetting) -> Self {
        match setting {
            SleepSetting::Fixed(secs) => DelayRange::fixed(secs),
            SleepSetting::Range([min, max]) => DelayRange::new(min, max),
        }
    }
}

impl From<DelayRange> for [u64; 2] {
    fn from(range: DelayRange) -> Self {
        [range.min_secs, range.max_secs]
    }
}

/// Blacklist detection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlacklistConfig {
    /// Remove proxies that answer with a blacklisted status.
    pub enabled: bool,

    /// HTTP statuses that mean the proxy has been blacklisted.
    pub http_status_codes: Vec<u16>,

    /// Remove the proxy even if it still has open connections.
    pub force: bool,

    /// Replays allowed per request before it is abandoned.
    pub retry_max: u32,

    /// Delay before a replay, drawn uniformly from this range.
    pub sleep: DelayRange,
}

impl Default for BlacklistConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            http_status_codes: vec![429, 503],
            force: true,
            retry_max: 2,
            sleep: DelayRange::new(60, 180),
        }
    }
}

/// Fleet warm-up/cool-down configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Switch the fleet to HOT on start and OFF on stop.
    pub enabled: bool,

    /// Seconds to wait after requesting HOT before work starts.
    pub warmup_secs: u64,
}

impl ScaleConfig {
    pub fn warmup(&self) -> Duration {
        Duration::from_secs(self.warmup_secs)
    }
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            warmup_secs: 120,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
