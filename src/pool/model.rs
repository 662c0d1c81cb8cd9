//! Fleet data model: projects, connectors, proxies and the derived snapshot.
//!
//! Everything except [`PoolSnapshot`] mirrors what the fleet-control API
//! returns. The snapshot is computed locally from one connector listing.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;

/// Operating mode requested of the fleet for a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectMode {
    Hot,
    Warm,
    Cold,
    Off,
}

impl ProjectMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectMode::Hot => "HOT",
            ProjectMode::Warm => "WARM",
            ProjectMode::Cold => "COLD",
            ProjectMode::Off => "OFF",
        }
    }
}

impl fmt::Display for ProjectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a mode string is not one of HOT, WARM, COLD, OFF.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid project mode '{0}', expected HOT, WARM, COLD or OFF")]
pub struct InvalidMode(pub String);

impl FromStr for ProjectMode {
    type Err = InvalidMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HOT" => Ok(ProjectMode::Hot),
            "WARM" => Ok(ProjectMode::Warm),
            "COLD" => Ok(ProjectMode::Cold),
            "OFF" => Ok(ProjectMode::Off),
            _ => Err(InvalidMode(s.to_string())),
        }
    }
}

impl Serialize for ProjectMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProjectMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Project status as reported by the fleet.
///
/// The fleet may report statuses this crate never requests (e.g. `CALM`);
/// those are kept verbatim so comparing against a mode still works.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProjectStatus {
    Known(ProjectMode),
    Other(String),
}

impl ProjectStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ProjectStatus::Known(mode) => mode.as_str(),
            ProjectStatus::Other(raw) => raw,
        }
    }

    pub fn mode(&self) -> Option<ProjectMode> {
        match self {
            ProjectStatus::Known(mode) => Some(*mode),
            ProjectStatus::Other(_) => None,
        }
    }
}

impl From<ProjectMode> for ProjectStatus {
    fn from(mode: ProjectMode) -> Self {
        ProjectStatus::Known(mode)
    }
}

impl From<&str> for ProjectStatus {
    fn from(raw: &str) -> Self {
        match raw.parse() {
            Ok(mode) => ProjectStatus::Known(mode),
            Err(_) => ProjectStatus::Other(raw.to_string()),
        }
    }
}

impl PartialEq<ProjectMode> for ProjectStatus {
    fn eq(&self, other: &ProjectMode) -> bool {
        self.mode() == Some(*other)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ProjectStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProjectStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ProjectStatus::from(raw.as_str()))
    }
}

/// Lifecycle state of a single proxy instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProxyStatus {
    Pending,
    Starting,
    Started,
    Stopping,
    Stopped,
    Error,
}

/// A proxy instance as listed by the fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyRecord {
    pub id: String,
    pub status: ProxyStatus,
    /// Egress fingerprint. The fleet sends an object once the proxy has been
    /// probed; absent or null before that.
    #[serde(default)]
    pub fingerprint: Option<serde_json::Value>,
    #[serde(default)]
    pub removing: bool,
}

impl ProxyRecord {
    pub fn has_fingerprint(&self) -> bool {
        match &self.fingerprint {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }

    /// A proxy can carry traffic once started, fingerprinted and not draining.
    pub fn is_usable(&self) -> bool {
        self.status == ProxyStatus::Started && self.has_fingerprint() && !self.removing
    }
}

/// Connector metadata. Only `active` matters to the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectorInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub active: bool,
}

/// One connector together with the proxies it currently owns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectorView {
    pub connector: ConnectorInfo,
    #[serde(default)]
    pub proxies: Vec<ProxyRecord>,
}

/// Project summary returned by the fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectView {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub status: ProjectStatus,
}

/// Removal order for a single proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyToRemove {
    pub id: String,
    pub force: bool,
}

/// Pool health derived from a single connector listing.
///
/// Replaced wholesale on each refresh, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub connectors_active: usize,
    pub proxies_usable: usize,
    pub captured_at: Instant,
}

impl PoolSnapshot {
    /// Count active connectors and usable proxies across `views`.
    pub fn from_views(views: &[ConnectorView], captured_at: Instant) -> Self {
        let connectors_active = views.iter().filter(|v| v.connector.active).count();
        let proxies_usable = views
            .iter()
            .flat_map(|v| v.proxies.iter())
            .filter(|p| p.is_usable())
            .count();

        Self {
            connectors_active,
            proxies_usable,
            captured_at,
        }
    }

    pub fn has_usable_proxies(&self) -> bool {
        self.proxies_usable > 0
    }

    /// Stale once strictly more than `interval` has elapsed since capture.
    pub fn is_stale(&self, now: Instant, interval: Duration) -> bool {
        now.saturating_duration_since(self.captured_at) > interval
    }
}
