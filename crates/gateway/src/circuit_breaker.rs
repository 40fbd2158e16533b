use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::info;

/// State of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation; requests flow through.
    Closed,
    /// Downstream service is failing; requests are rejected immediately.
    Open,
    /// Recovery probe; a single request is allowed to test service health.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Configuration for a per-service circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures before opening the circuit.
    pub failure_threshold: u32,
    /// Number of consecutive successes in `HalfOpen` state to close the circuit.
    pub success_threshold: u32,
    /// How long to wait in `Open` state before transitioning to `HalfOpen`.
    pub open_duration: Duration,
}

impl CircuitBreakerConfig {
    /// Validate configuration values.
    ///
    /// Returns `Err` with a description if any value is invalid:
    /// - `failure_threshold` must be >= 1
    /// - `success_threshold` must be >= 1
    ///
    /// `open_duration = 0` is intentionally allowed (useful for testing).
    pub fn validate(&self) -> Result<(), String> {
        if self.failure_threshold < 1 {
            return Err("failure_threshold must be >= 1".into());
        }
        if self.success_threshold < 1 {
            return Err("success_threshold must be >= 1".into());
        }
        Ok(())
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            open_duration: Duration::from_secs(30),
        }
    }
}

/// Internal mutable state for a single circuit breaker.
struct CircuitData {
    state: CircuitState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    /// When the circuit last entered `Open`, for cooldown measurement.
    /// Not refreshed by stragglers failing while already open.
    opened_at: Option<Instant>,
    /// Wall-clock mirror of `opened_at` for status reporting.
    opened_at_wall: Option<DateTime<Utc>>,
    /// Whether a recovery probe is currently in flight.
    probe_in_flight: bool,
}

impl CircuitData {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            consecutive_successes: 0,
            opened_at: None,
            opened_at_wall: None,
            probe_in_flight: false,
        }
    }

    fn open(&mut self) {
        self.state = CircuitState::Open;
        self.consecutive_successes = 0;
        self.opened_at = Some(Instant::now());
        self.opened_at_wall = Some(Utc::now());
        self.probe_in_flight = false;
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.consecutive_successes = 0;
        self.opened_at = None;
        self.opened_at_wall = None;
        self.probe_in_flight = false;
    }
}

/// A circuit breaker guarding calls to a single downstream service.
///
/// Tracks consecutive failures and successes, opening the circuit after
/// `failure_threshold` consecutive failures and probing recovery with a
/// single request once `open_duration` has elapsed. Interior mutability
/// keeps the public methods `&self` so one breaker can be shared across
/// request handlers.
pub struct CircuitBreaker {
    service: String,
    config: CircuitBreakerConfig,
    data: RwLock<CircuitData>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker for the named service, starting `Closed`.
    pub fn new(service: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            service: service.into(),
            config,
            data: RwLock::new(CircuitData::new()),
        }
    }

    /// Check whether a request may proceed, applying any time-based
    /// transition first.
    ///
    /// Returns the effective state for this caller and the transition that
    /// occurred, if any. In `HalfOpen`, exactly one caller is granted the
    /// probe; concurrent callers observe `Open` and must short-circuit.
    pub fn check(&self) -> (CircuitState, Option<(CircuitState, CircuitState)>) {
        let mut data = self
            .data
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        match data.state {
            CircuitState::Closed => (CircuitState::Closed, None),
            CircuitState::Open => {
                if let Some(opened) = data.opened_at
                    && opened.elapsed() >= self.config.open_duration
                {
                    data.state = CircuitState::HalfOpen;
                    data.consecutive_successes = 0;
                    data.probe_in_flight = true;
                    self.log_transition(CircuitState::Open, CircuitState::HalfOpen, &data);
                    (
                        CircuitState::HalfOpen,
                        Some((CircuitState::Open, CircuitState::HalfOpen)),
                    )
                } else {
                    (CircuitState::Open, None)
                }
            }
            CircuitState::HalfOpen => {
                if data.probe_in_flight {
                    // Another caller holds the probe; treat the circuit as
                    // still open for this caller.
                    (CircuitState::Open, None)
                } else {
                    data.probe_in_flight = true;
                    (CircuitState::HalfOpen, None)
                }
            }
        }
    }

    /// Record a successful call. Returns the transition that occurred, if any.
    pub fn record_success(&self) -> Option<(CircuitState, CircuitState)> {
        let mut data = self
            .data
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        match data.state {
            CircuitState::Closed => {
                data.consecutive_failures = 0;
                None
            }
            CircuitState::HalfOpen => {
                data.consecutive_successes += 1;
                data.probe_in_flight = false;
                if data.consecutive_successes >= self.config.success_threshold {
                    data.close();
                    self.log_transition(CircuitState::HalfOpen, CircuitState::Closed, &data);
                    Some((CircuitState::HalfOpen, CircuitState::Closed))
                } else {
                    None
                }
            }
            // A call that was in flight when the circuit opened; its outcome
            // no longer influences the state machine.
            CircuitState::Open => None,
        }
    }

    /// Record a failed call. Returns the transition that occurred, if any.
    pub fn record_failure(&self) -> Option<(CircuitState, CircuitState)> {
        let mut data = self
            .data
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        match data.state {
            CircuitState::Closed => {
                data.consecutive_failures += 1;
                data.consecutive_successes = 0;
                if data.consecutive_failures >= self.config.failure_threshold {
                    data.open();
                    self.log_transition(CircuitState::Closed, CircuitState::Open, &data);
                    Some((CircuitState::Closed, CircuitState::Open))
                } else {
                    None
                }
            }
            CircuitState::HalfOpen => {
                // The probe failed: reopen with a fresh cooldown window.
                data.consecutive_failures += 1;
                data.open();
                self.log_transition(CircuitState::HalfOpen, CircuitState::Open, &data);
                Some((CircuitState::HalfOpen, CircuitState::Open))
            }
            // Straggler from before the trip; the cooldown window is measured
            // from when the circuit opened, so nothing to update.
            CircuitState::Open => None,
        }
    }

    /// Get current state without triggering transitions.
    pub fn state(&self) -> CircuitState {
        self.data
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .state
    }

    /// Get the configuration for this circuit breaker.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Get the guarded service name.
    pub fn service_name(&self) -> &str {
        &self.service
    }

    /// Force the circuit open, starting a fresh cooldown window.
    pub fn trip(&self) {
        let mut data = self
            .data
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let from = data.state;
        data.open();
        if from != CircuitState::Open {
            self.log_transition(from, CircuitState::Open, &data);
        }
    }

    /// Reset the circuit breaker to `Closed` state.
    pub fn reset(&self) {
        let mut data = self
            .data
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let from = data.state;
        data.close();
        if from != CircuitState::Closed {
            self.log_transition(from, CircuitState::Closed, &data);
        }
    }

    /// Take a point-in-time status snapshot for the reporting surface.
    pub fn snapshot(&self) -> agora_core::CircuitStatus {
        let data = self
            .data
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        agora_core::CircuitStatus {
            name: self.service.clone(),
            state: data.state.to_string(),
            consecutive_failures: data.consecutive_failures,
            consecutive_successes: data.consecutive_successes,
            opened_at: data.opened_at_wall,
        }
    }

    fn log_transition(&self, from: CircuitState, to: CircuitState, data: &CircuitData) {
        info!(
            service = %self.service,
            from = %from,
            to = %to,
            consecutive_failures = data.consecutive_failures,
            consecutive_successes = data.consecutive_successes,
            "circuit breaker state transition"
        );
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self
            .data
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f.debug_struct("CircuitBreaker")
            .field("service", &self.service)
            .field("config", &self.config)
            .field("state", &data.state)
            .field("consecutive_failures", &data.consecutive_failures)
            .field("consecutive_successes", &data.consecutive_successes)
            .finish_non_exhaustive()
    }
}

/// Registry of circuit breakers, one per downstream service.
///
/// Built once at startup from configuration and then shared read-only;
/// individual breakers handle their own interior mutability.
pub struct CircuitBreakerRegistry {
    breakers: HashMap<String, Arc<CircuitBreaker>>,
}

impl CircuitBreakerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            breakers: HashMap::new(),
        }
    }

    /// Register a circuit breaker for a service, replacing any existing one.
    pub fn register(&mut self, service: impl Into<String>, config: CircuitBreakerConfig) {
        let service = service.into();
        let breaker = Arc::new(CircuitBreaker::new(service.clone(), config));
        self.breakers.insert(service, breaker);
    }

    /// Look up the circuit breaker for a service.
    pub fn get(&self, service: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(service).cloned()
    }

    /// Names of all registered services, sorted.
    pub fn services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.breakers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Status snapshots for all registered breakers, sorted by service name.
    pub fn snapshots(&self) -> Vec<agora_core::CircuitStatus> {
        let mut snaps: Vec<agora_core::CircuitStatus> =
            self.breakers.values().map(|cb| cb.snapshot()).collect();
        snaps.sort_by(|a, b| a.name.cmp(&b.name));
        snaps
    }

    /// Number of registered breakers.
    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CircuitBreakerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreakerRegistry")
            .field("services", &self.services())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: 3,
            success_threshold: 2,
            open_duration: Duration::from_secs(30),
        }
    }

    /// Helper: call `check()` and return only the effective state.
    fn check_state(cb: &CircuitBreaker) -> CircuitState {
        cb.check().0
    }

    // -- CircuitState tests ---------------------------------------------------

    #[test]
    fn circuit_state_display() {
        assert_eq!(CircuitState::Closed.to_string(), "closed");
        assert_eq!(CircuitState::Open.to_string(), "open");
        assert_eq!(CircuitState::HalfOpen.to_string(), "half_open");
    }

    // -- CircuitBreakerConfig tests -------------------------------------------

    #[test]
    fn default_config_values() {
        let cfg = CircuitBreakerConfig::default();
        assert_eq!(cfg.failure_threshold, 5);
        assert_eq!(cfg.success_threshold, 2);
        assert_eq!(cfg.open_duration, Duration::from_secs(30));
    }

    #[test]
    fn config_validation_rejects_zero_failure_threshold() {
        let config = CircuitBreakerConfig {
            failure_threshold: 0,
            ..default_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_validation_rejects_zero_success_threshold() {
        let config = CircuitBreakerConfig {
            success_threshold: 0,
            ..default_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_validation_accepts_valid_config() {
        assert!(default_config().validate().is_ok());
    }

    #[test]
    fn config_validation_allows_zero_open_duration() {
        let config = CircuitBreakerConfig {
            open_duration: Duration::ZERO,
            ..default_config()
        };
        assert!(config.validate().is_ok());
    }

    // -- CircuitBreaker state transition tests --------------------------------

    #[test]
    fn new_breaker_starts_closed() {
        let cb = CircuitBreaker::new("payment", default_config());
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(check_state(&cb), CircuitState::Closed);
    }

    #[test]
    fn failures_below_threshold_stay_closed() {
        let cb = CircuitBreaker::new("payment", default_config());
        assert!(cb.record_failure().is_none());
        assert!(cb.record_failure().is_none());
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn opens_exactly_at_failure_threshold() {
        let cb = CircuitBreaker::new("payment", default_config());
        assert!(cb.record_failure().is_none());
        assert!(cb.record_failure().is_none());
        // Third failure trips the circuit
        let transition = cb.record_failure();
        assert_eq!(transition, Some((CircuitState::Closed, CircuitState::Open)));
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn success_resets_failure_count() {
        let cb = CircuitBreaker::new("payment", default_config());
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        // Need 3 more consecutive failures to trip
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn rapid_alternation_never_trips() {
        let cb = CircuitBreaker::new("payment", default_config());
        for _ in 0..50 {
            cb.record_failure();
            cb.record_success();
        }
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn large_threshold_tolerates_many_failures() {
        let config = CircuitBreakerConfig {
            failure_threshold: 100,
            ..default_config()
        };
        let cb = CircuitBreaker::new("payment", config);
        // A few failures shouldn't trip a very large threshold.
        for _ in 0..99 {
            cb.record_failure();
        }
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn open_circuit_short_circuits_callers() {
        let cb = CircuitBreaker::new("payment", default_config());
        for _ in 0..3 {
            cb.record_failure();
        }
        let (state, transition) = cb.check();
        assert_eq!(state, CircuitState::Open);
        assert!(transition.is_none());
    }

    #[test]
    fn open_transitions_to_half_open_after_cooldown() {
        let config = CircuitBreakerConfig {
            open_duration: Duration::ZERO,
            ..default_config()
        };
        let cb = CircuitBreaker::new("payment", config);
        for _ in 0..3 {
            cb.record_failure();
        }
        let (state, transition) = cb.check();
        assert_eq!(state, CircuitState::HalfOpen);
        assert_eq!(transition, Some((CircuitState::Open, CircuitState::HalfOpen)));
    }

    #[test]
    fn only_one_caller_granted_half_open_probe() {
        let config = CircuitBreakerConfig {
            open_duration: Duration::ZERO,
            ..default_config()
        };
        let cb = CircuitBreaker::new("payment", config);
        for _ in 0..3 {
            cb.record_failure();
        }
        // First caller takes the probe, second is rejected.
        assert_eq!(check_state(&cb), CircuitState::HalfOpen);
        assert_eq!(check_state(&cb), CircuitState::Open);
        assert_eq!(check_state(&cb), CircuitState::Open);
    }

    #[test]
    fn probe_success_below_threshold_allows_next_probe() {
        let config = CircuitBreakerConfig {
            open_duration: Duration::ZERO,
            ..default_config()
        };
        let cb = CircuitBreaker::new("payment", config);
        for _ in 0..3 {
            cb.record_failure();
        }
        assert_eq!(check_state(&cb), CircuitState::HalfOpen);
        // One success of the two required: still half-open, probe slot freed.
        assert!(cb.record_success().is_none());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert_eq!(check_state(&cb), CircuitState::HalfOpen);
    }

    #[test]
    fn success_threshold_closes_circuit() {
        let config = CircuitBreakerConfig {
            open_duration: Duration::ZERO,
            ..default_config()
        };
        let cb = CircuitBreaker::new("payment", config);
        for _ in 0..3 {
            cb.record_failure();
        }
        assert_eq!(check_state(&cb), CircuitState::HalfOpen);
        assert!(cb.record_success().is_none());
        assert_eq!(check_state(&cb), CircuitState::HalfOpen);
        let transition = cb.record_success();
        assert_eq!(
            transition,
            Some((CircuitState::HalfOpen, CircuitState::Closed))
        );
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.snapshot().opened_at.is_none());
    }

    #[test]
    fn probe_failure_reopens_circuit() {
        let config = CircuitBreakerConfig {
            open_duration: Duration::ZERO,
            ..default_config()
        };
        let cb = CircuitBreaker::new("payment", config);
        for _ in 0..3 {
            cb.record_failure();
        }
        assert_eq!(check_state(&cb), CircuitState::HalfOpen);
        let transition = cb.record_failure();
        assert_eq!(transition, Some((CircuitState::HalfOpen, CircuitState::Open)));
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.snapshot().opened_at.is_some());
    }

    #[test]
    fn success_while_open_is_ignored() {
        let cb = CircuitBreaker::new("payment", default_config());
        for _ in 0..3 {
            cb.record_failure();
        }
        // In-flight call from before the trip completes successfully.
        assert!(cb.record_success().is_none());
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn straggler_failure_does_not_extend_cooldown() {
        let config = CircuitBreakerConfig {
            open_duration: Duration::from_millis(30),
            ..default_config()
        };
        let cb = CircuitBreaker::new("payment", config);
        for _ in 0..3 {
            cb.record_failure();
        }
        std::thread::sleep(Duration::from_millis(20));
        // A late failure while open must not restart the cooldown clock.
        assert!(cb.record_failure().is_none());
        std::thread::sleep(Duration::from_millis(15));
        assert_eq!(check_state(&cb), CircuitState::HalfOpen);
    }

    #[test]
    fn full_recovery_cycle() {
        let config = CircuitBreakerConfig {
            failure_threshold: 2,
            success_threshold: 2,
            open_duration: Duration::ZERO,
        };
        let cb = CircuitBreaker::new("payment", config);
        for cycle in 0..3 {
            cb.record_failure();
            cb.record_failure();
            assert_eq!(cb.state(), CircuitState::Open, "cycle {cycle}");
            assert_eq!(check_state(&cb), CircuitState::HalfOpen);
            cb.record_success();
            assert_eq!(check_state(&cb), CircuitState::HalfOpen);
            cb.record_success();
            assert_eq!(cb.state(), CircuitState::Closed, "cycle {cycle}");
        }
    }

    // -- trip / reset ---------------------------------------------------------

    #[test]
    fn trip_forces_open() {
        let cb = CircuitBreaker::new("payment", default_config());
        cb.trip();
        assert_eq!(cb.state(), CircuitState::Open);
        let snap = cb.snapshot();
        assert_eq!(snap.state, "open");
        assert!(snap.opened_at.is_some());
    }

    #[test]
    fn reset_returns_to_closed() {
        let cb = CircuitBreaker::new("payment", default_config());
        for _ in 0..3 {
            cb.record_failure();
        }
        assert_eq!(cb.state(), CircuitState::Open);
        cb.reset();
        assert_eq!(cb.state(), CircuitState::Closed);
        let snap = cb.snapshot();
        assert_eq!(snap.consecutive_failures, 0);
        assert!(snap.opened_at.is_none());
    }

    #[test]
    fn reset_from_half_open() {
        let config = CircuitBreakerConfig {
            open_duration: Duration::ZERO,
            ..default_config()
        };
        let cb = CircuitBreaker::new("payment", config);
        for _ in 0..3 {
            cb.record_failure();
        }
        assert_eq!(check_state(&cb), CircuitState::HalfOpen);
        cb.reset();
        assert_eq!(cb.state(), CircuitState::Closed);
        // Probe slot must be released by the reset.
        for _ in 0..3 {
            cb.record_failure();
        }
        assert_eq!(check_state(&cb), CircuitState::HalfOpen);
    }

    #[test]
    fn reset_is_idempotent() {
        let cb = CircuitBreaker::new("payment", default_config());
        cb.reset();
        cb.reset();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    // -- snapshot -------------------------------------------------------------

    #[test]
    fn snapshot_reflects_counters() {
        let cb = CircuitBreaker::new("payment", default_config());
        cb.record_failure();
        cb.record_failure();
        let snap = cb.snapshot();
        assert_eq!(snap.name, "payment");
        assert_eq!(snap.state, "closed");
        assert_eq!(snap.consecutive_failures, 2);
        assert_eq!(snap.consecutive_successes, 0);
        assert!(snap.opened_at.is_none());
    }

    #[test]
    fn snapshot_records_opened_at_when_tripped() {
        let cb = CircuitBreaker::new("payment", default_config());
        let before = Utc::now();
        for _ in 0..3 {
            cb.record_failure();
        }
        let snap = cb.snapshot();
        let opened_at = snap.opened_at.unwrap();
        assert!(opened_at >= before);
        assert!(opened_at <= Utc::now());
    }

    // -- concurrency ----------------------------------------------------------

    #[test]
    fn concurrent_callers_get_single_probe() {
        use std::sync::Barrier;
        use std::sync::atomic::{AtomicU32, Ordering};

        let config = CircuitBreakerConfig {
            open_duration: Duration::ZERO,
            ..default_config()
        };
        let cb = Arc::new(CircuitBreaker::new("payment", config));
        for _ in 0..3 {
            cb.record_failure();
        }

        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));
        let probes = Arc::new(AtomicU32::new(0));
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let cb = Arc::clone(&cb);
                let barrier = Arc::clone(&barrier);
                let probes = Arc::clone(&probes);
                std::thread::spawn(move || {
                    barrier.wait();
                    if cb.check().0 == CircuitState::HalfOpen {
                        probes.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(probes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_failures_trip_once() {
        let cb = Arc::new(CircuitBreaker::new("payment", default_config()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cb = Arc::clone(&cb);
                std::thread::spawn(move || {
                    let mut transitions = 0;
                    for _ in 0..10 {
                        if cb.record_failure().is_some() {
                            transitions += 1;
                        }
                    }
                    transitions
                })
            })
            .collect();
        let total: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();

        // All threads hammering failures must produce exactly one
        // Closed -> Open transition.
        assert_eq!(total, 1);
        assert_eq!(cb.state(), CircuitState::Open);
    }

    // -- CircuitBreakerRegistry -----------------------------------------------

    #[test]
    fn registry_register_and_get() {
        let mut registry = CircuitBreakerRegistry::new();
        registry.register("payment", default_config());
        registry.register("auth", default_config());

        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
        assert!(registry.get("payment").is_some());
        assert!(registry.get("checkout").is_none());
    }

    #[test]
    fn registry_services_sorted() {
        let mut registry = CircuitBreakerRegistry::new();
        registry.register("seller", default_config());
        registry.register("auth", default_config());
        registry.register("payment", default_config());

        assert_eq!(registry.services(), vec!["auth", "payment", "seller"]);
    }

    #[test]
    fn registry_shares_breaker_state() {
        let mut registry = CircuitBreakerRegistry::new();
        registry.register("payment", default_config());

        let first = registry.get("payment").unwrap();
        for _ in 0..3 {
            first.record_failure();
        }
        let second = registry.get("payment").unwrap();
        assert_eq!(second.state(), CircuitState::Open);
    }

    #[test]
    fn registry_snapshots_sorted_by_name() {
        let mut registry = CircuitBreakerRegistry::new();
        registry.register("seller", default_config());
        registry.register("auth", default_config());
        if let Some(cb) = registry.get("seller") {
            cb.trip();
        }

        let snaps = registry.snapshots();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].name, "auth");
        assert_eq!(snaps[0].state, "closed");
        assert_eq!(snaps[1].name, "seller");
        assert_eq!(snaps[1].state, "open");
    }
}
