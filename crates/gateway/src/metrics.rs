use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters tracking gateway health-polling and circuit outcomes.
///
/// All counters use relaxed ordering for maximum throughput. For a
/// consistent point-in-time view, call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    /// Poll cycles completed by the health poller.
    pub polls: AtomicU64,
    /// Probes that observed a service as degraded or unreachable.
    pub probe_failures: AtomicU64,
    /// Calls rejected because the service circuit breaker was open.
    pub short_circuited: AtomicU64,
    /// Circuit breaker state transitions (any direction).
    pub circuit_transitions: AtomicU64,
}

impl GatewayMetrics {
    /// Increment the poll-cycle counter.
    pub fn increment_polls(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the probe-failure counter.
    pub fn increment_probe_failures(&self) {
        self.probe_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the short-circuited call counter.
    pub fn increment_short_circuited(&self) {
        self.short_circuited.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the circuit-transition counter.
    pub fn increment_circuit_transitions(&self) {
        self.circuit_transitions.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a consistent point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            polls: self.polls.load(Ordering::Relaxed),
            probe_failures: self.probe_failures.load(Ordering::Relaxed),
            short_circuited: self.short_circuited.load(Ordering::Relaxed),
            circuit_transitions: self.circuit_transitions.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`GatewayMetrics`] at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Poll cycles completed.
    pub polls: u64,
    /// Probes that observed a service as degraded or unreachable.
    pub probe_failures: u64,
    /// Calls rejected because a circuit breaker was open.
    pub short_circuited: u64,
    /// Circuit breaker state transitions.
    pub circuit_transitions: u64,
}
