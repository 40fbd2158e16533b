//! Wire shapes for the per-service health surface.
//!
//! Every service exposes the same three probes: `GET /health` (informational
//! aggregate), `GET /health/live` (process up) and `GET /health/ready`
//! (dependencies reachable). The gateway polls readiness; orchestrators use
//! liveness; operators and dashboards read the aggregate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Result of a single dependency check inside [`HealthReport::checks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    Ok,
    Error,
}

/// Overall self-assessment in [`HealthReport::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// Every dependency check passed.
    Ok,
    /// At least one dependency check failed; the process itself is fine.
    Degraded,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthState,
    /// Service name as registered with the gateway.
    pub service: String,
    /// Seconds since process start.
    pub uptime: u64,
    /// Per-dependency results, keyed by dependency name. Sorted for stable
    /// output.
    pub checks: BTreeMap<String, CheckState>,
}

/// Status discriminator for `GET /health/ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyState {
    Ok,
    NotReady,
}

/// Body of `GET /health/ready`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub status: ReadyState,
    /// Which dependency is blocking readiness, e.g. `postgres unavailable`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ReadinessReport {
    /// All dependencies reachable.
    #[must_use]
    pub fn ready() -> Self {
        Self {
            status: ReadyState::Ok,
            reason: None,
        }
    }

    /// Blocked on the named dependency.
    #[must_use]
    pub fn not_ready(reason: impl Into<String>) -> Self {
        Self {
            status: ReadyState::NotReady,
            reason: Some(reason.into()),
        }
    }
}

/// Body of `GET /health/live`. Liveness consults no dependencies; a serving
/// process always answers `{"status":"ok"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessReport {
    pub status: HealthState,
}

impl LivenessReport {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: HealthState::Ok,
        }
    }
}
