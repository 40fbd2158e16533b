use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of `GET /api/health/circuits`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitStatus {
    /// Backend service the breaker guards.
    pub name: String,

    /// `closed`, `open` or `half_open`.
    pub state: String,

    /// Consecutive failures observed since the last success.
    pub consecutive_failures: u32,

    /// Consecutive successes observed since the last failure.
    pub consecutive_successes: u32,

    /// When the breaker last transitioned into the open state. Cleared when
    /// it closes again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened_at: Option<DateTime<Utc>>,
}

/// Body of `GET /api/health/circuits`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCircuitsResponse {
    pub circuits: Vec<CircuitStatus>,
}

/// Response for the manual trip/reset operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitActionResponse {
    pub name: String,
    /// State after the action was applied.
    pub state: String,
    pub message: String,
}
