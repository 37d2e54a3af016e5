//! Records exchanged with the status provider and the renderer.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WatchError;

/// Stable, collision-free identifier of a monitored probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StableId(Uuid);

impl StableId {
    /// Wraps a UUID.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Parses a UUID-shaped identifier, returning `None` for anything else.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s.trim()).ok().map(Self)
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Current status of a probe.
///
/// Values coming from the backend that this client does not know decode to
/// [`ProbeStatus::Unknown`]. Operators cannot filter on `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    /// Checks are passing.
    Up,
    /// Checks are failing.
    Down,
    /// Checks pass but slowly or partially.
    Degraded,
    /// Monitoring is paused.
    Paused,
    /// No check has completed yet.
    Pending,
    /// Status reported by a newer backend.
    #[serde(other)]
    Unknown,
}

impl ProbeStatus {
    const EXPECTED: &'static str = "up, down, degraded, paused, pending";

    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Degraded => "degraded",
            Self::Paused => "paused",
            Self::Pending => "pending",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProbeStatus {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "degraded" => Ok(Self::Degraded),
            "paused" => Ok(Self::Paused),
            "pending" => Ok(Self::Pending),
            _ => Err(WatchError::InvalidFilter {
                kind: "status",
                value: s.to_string(),
                expected: Self::EXPECTED,
            }),
        }
    }
}

/// Result of a single check execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckOutcome {
    /// The check passed.
    Success,
    /// The check ran and its assertions failed.
    Failure,
    /// The target did not answer in time.
    Timeout,
    /// The check could not run.
    Error,
    /// Outcome reported by a newer backend.
    #[serde(other)]
    Unknown,
}

impl CheckOutcome {
    const EXPECTED: &'static str = "success, failure, timeout, error";

    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Timeout => "timeout",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckOutcome {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "timeout" => Ok(Self::Timeout),
            "error" => Ok(Self::Error),
            _ => Err(WatchError::InvalidFilter {
                kind: "outcome",
                value: s.to_string(),
                expected: Self::EXPECTED,
            }),
        }
    }
}

/// Point-in-time status of one probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStatus {
    /// Probe ID.
    pub id: StableId,
    /// Display name.
    pub name: String,
    /// Monitored URL, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Current status.
    pub status: ProbeStatus,
    /// When the last check finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Latency of the last check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    /// Uptime over the backend's default period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_percent: Option<f64>,
}

/// Name/ID pair returned by a probe search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    /// Probe ID.
    pub id: StableId,
    /// Display name.
    pub name: String,
}

/// One check result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Probe that produced the result.
    pub probe_id: StableId,
    /// When the check ran.
    pub timestamp: DateTime<Utc>,
    /// Check outcome.
    pub outcome: CheckOutcome,
    /// Region the check ran from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Observed latency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    /// HTTP status code returned by the target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Failure detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Extra backend-specific fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// Records that carry an observation instant.
pub trait Timestamped {
    /// When the record was observed.
    fn timestamp(&self) -> DateTime<Utc>;
}

impl Timestamped for Event {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
