use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::circuit_breaker::{CircuitBreakerRegistry, CircuitState};
use crate::metrics::GatewayMetrics;

/// Error returned by [`CircuitGuard::call`].
#[derive(Debug, Error)]
pub enum CallError<E: std::error::Error + 'static> {
    /// The circuit is open; the call was rejected without dispatching.
    #[error("circuit open for {service}")]
    CircuitOpen { service: String },

    /// The call exceeded the configured timeout.
    #[error("call to {service} timed out after {timeout_ms} ms")]
    Timeout { service: String, timeout_ms: u64 },

    /// The underlying operation failed.
    #[error("upstream error from {service}: {source}")]
    Upstream {
        service: String,
        #[source]
        source: E,
    },
}

/// Failure classification for guarded HTTP calls.
#[derive(Debug, Error)]
pub enum HttpCallError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream answered with a server error.
    #[error("upstream returned {0}")]
    Status(reqwest::StatusCode),
}

/// Wraps outbound calls to backend services with per-service circuit
/// breaking and a call timeout.
///
/// A timed-out call counts as a failure. When the circuit for a service
/// is open, calls return [`CallError::CircuitOpen`] without dispatching.
pub struct CircuitGuard {
    breakers: Arc<CircuitBreakerRegistry>,
    metrics: Arc<GatewayMetrics>,
    call_timeout: Duration,
    call_timeout_ms: u64,
}

impl CircuitGuard {
    /// Create a guard over the given breaker registry.
    pub fn new(
        breakers: Arc<CircuitBreakerRegistry>,
        metrics: Arc<GatewayMetrics>,
        call_timeout: Duration,
    ) -> Self {
        let call_timeout_ms = u64::try_from(call_timeout.as_millis()).unwrap_or(u64::MAX);
        Self {
            breakers,
            metrics,
            call_timeout,
            call_timeout_ms,
        }
    }

    /// Execute an operation against a service under its circuit breaker.
    ///
    /// Services without a registered breaker are dispatched unguarded,
    /// though still bounded by the call timeout.
    pub async fn call<T, E, F, Fut>(&self, service: &str, operation: F) -> Result<T, CallError<E>>
    where
        E: std::error::Error + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(breaker) = self.breakers.get(service) else {
            return match tokio::time::timeout(self.call_timeout, operation()).await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(source)) => Err(CallError::Upstream {
                    service: service.to_string(),
                    source,
                }),
                Err(_) => Err(CallError::Timeout {
                    service: service.to_string(),
                    timeout_ms: self.call_timeout_ms,
                }),
            };
        };

        let (state, transition) = breaker.check();
        if transition.is_some() {
            self.metrics.increment_circuit_transitions();
        }
        if state == CircuitState::Open {
            self.metrics.increment_short_circuited();
            return Err(CallError::CircuitOpen {
                service: service.to_string(),
            });
        }

        match tokio::time::timeout(self.call_timeout, operation()).await {
            Ok(Ok(value)) => {
                if breaker.record_success().is_some() {
                    self.metrics.increment_circuit_transitions();
                }
                Ok(value)
            }
            Ok(Err(source)) => {
                if breaker.record_failure().is_some() {
                    self.metrics.increment_circuit_transitions();
                }
                Err(CallError::Upstream {
                    service: service.to_string(),
                    source,
                })
            }
            Err(_) => {
                // A timed-out call counts as a failure, not a no-op.
                if breaker.record_failure().is_some() {
                    self.metrics.increment_circuit_transitions();
                }
                Err(CallError::Timeout {
                    service: service.to_string(),
                    timeout_ms: self.call_timeout_ms,
                })
            }
        }
    }

    /// Execute an HTTP request against a service under its circuit breaker.
    ///
    /// Server errors and transport failures count against the circuit.
    /// Client errors (400, 401, 404) are the caller's problem and pass
    /// through as successful responses without tripping the circuit.
    pub async fn call_http(
        &self,
        service: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, CallError<HttpCallError>> {
        self.call(service, || async move {
            let response = request.send().await.map_err(HttpCallError::Transport)?;
            let status = response.status();
            if status.is_server_error() {
                return Err(HttpCallError::Status(status));
            }
            Ok(response)
        })
        .await
    }
}

impl std::fmt::Debug for CircuitGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitGuard")
            .field("services", &self.breakers.services())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::circuit_breaker::CircuitBreakerConfig;

    fn registry_with(service: &str, config: CircuitBreakerConfig) -> Arc<CircuitBreakerRegistry> {
        let mut registry = CircuitBreakerRegistry::new();
        registry.register(service, config);
        Arc::new(registry)
    }

    fn guard_over(breakers: Arc<CircuitBreakerRegistry>, timeout: Duration) -> CircuitGuard {
        CircuitGuard::new(breakers, Arc::new(GatewayMetrics::default()), timeout)
    }

    #[tokio::test]
    async fn passes_through_when_closed() {
        let breakers = registry_with("auth", CircuitBreakerConfig::default());
        let guard = guard_over(Arc::clone(&breakers), Duration::from_secs(1));

        let result = guard
            .call("auth", || async { Ok::<_, std::io::Error>(42u32) })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(
            breakers.get("auth").unwrap().state(),
            CircuitState::Closed
        );
    }

    #[tokio::test]
    async fn open_circuit_rejects_without_dispatch() {
        let config = CircuitBreakerConfig {
            failure_threshold: 2,
            ..CircuitBreakerConfig::default()
        };
        let breakers = registry_with("auth", config);
        let metrics = Arc::new(GatewayMetrics::default());
        let guard = CircuitGuard::new(
            Arc::clone(&breakers),
            Arc::clone(&metrics),
            Duration::from_secs(1),
        );

        for _ in 0..2 {
            let result: Result<u32, _> = guard
                .call("auth", || async {
                    Err::<u32, _>(std::io::Error::other("boom"))
                })
                .await;
            assert!(matches!(result, Err(CallError::Upstream { .. })));
        }
        assert_eq!(breakers.get("auth").unwrap().state(), CircuitState::Open);

        let invoked = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&invoked);
        let result = guard
            .call("auth", move || async move {
                flag.store(true, Ordering::SeqCst);
                Ok::<_, std::io::Error>(1u32)
            })
            .await;

        assert!(matches!(result, Err(CallError::CircuitOpen { .. })));
        assert!(!invoked.load(Ordering::SeqCst));
        assert_eq!(metrics.snapshot().short_circuited, 1);
    }

    #[tokio::test]
    async fn timeout_counts_as_failure() {
        let config = CircuitBreakerConfig {
            failure_threshold: 1,
            ..CircuitBreakerConfig::default()
        };
        let breakers = registry_with("payment", config);
        let guard = guard_over(Arc::clone(&breakers), Duration::from_millis(50));

        let result = guard
            .call("payment", || async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok::<_, std::io::Error>(1u32)
            })
            .await;

        assert!(matches!(result, Err(CallError::Timeout { .. })));
        assert_eq!(breakers.get("payment").unwrap().state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn recovery_through_half_open_probe() {
        let config = CircuitBreakerConfig {
            failure_threshold: 1,
            success_threshold: 1,
            open_duration: Duration::ZERO,
        };
        let breakers = registry_with("seller", config);
        let metrics = Arc::new(GatewayMetrics::default());
        let guard = CircuitGuard::new(
            Arc::clone(&breakers),
            Arc::clone(&metrics),
            Duration::from_secs(1),
        );

        let result: Result<u32, _> = guard
            .call("seller", || async {
                Err::<u32, _>(std::io::Error::other("down"))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(breakers.get("seller").unwrap().state(), CircuitState::Open);

        // Cooldown is zero, so the next call is granted the probe and its
        // success closes the circuit.
        let result = guard
            .call("seller", || async { Ok::<_, std::io::Error>(7u32) })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(breakers.get("seller").unwrap().state(), CircuitState::Closed);

        // Closed -> Open, Open -> HalfOpen, HalfOpen -> Closed.
        assert_eq!(metrics.snapshot().circuit_transitions, 3);
    }

    #[tokio::test]
    async fn unknown_service_passes_through_unguarded() {
        let breakers = Arc::new(CircuitBreakerRegistry::new());
        let metrics = Arc::new(GatewayMetrics::default());
        let guard = CircuitGuard::new(breakers, Arc::clone(&metrics), Duration::from_secs(1));

        let ok = guard
            .call("anything", || async { Ok::<_, std::io::Error>(5u32) })
            .await;
        assert_eq!(ok.unwrap(), 5);

        let err: Result<u32, _> = guard
            .call("anything", || async {
                Err::<u32, _>(std::io::Error::other("oops"))
            })
            .await;
        assert!(matches!(err, Err(CallError::Upstream { .. })));
        assert_eq!(metrics.snapshot().circuit_transitions, 0);
    }

    #[tokio::test]
    async fn call_http_server_error_trips_circuit() {
        use axum::Router;
        use axum::http::StatusCode;
        use axum::routing::get;

        let app = Router::new().route(
            "/orders",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = CircuitBreakerConfig {
            failure_threshold: 1,
            ..CircuitBreakerConfig::default()
        };
        let breakers = registry_with("payment", config);
        let guard = guard_over(Arc::clone(&breakers), Duration::from_secs(1));
        let client = reqwest::Client::new();

        let result = guard
            .call_http("payment", client.get(format!("http://{addr}/orders")))
            .await;
        assert!(matches!(
            result,
            Err(CallError::Upstream {
                source: HttpCallError::Status(_),
                ..
            })
        ));
        assert_eq!(breakers.get("payment").unwrap().state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn call_http_client_error_does_not_trip_circuit() {
        use axum::Router;
        use axum::http::StatusCode;
        use axum::routing::get;

        let app = Router::new().route("/orders", get(|| async { StatusCode::NOT_FOUND }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = CircuitBreakerConfig {
            failure_threshold: 1,
            ..CircuitBreakerConfig::default()
        };
        let breakers = registry_with("payment", config);
        let guard = guard_over(Arc::clone(&breakers), Duration::from_secs(1));
        let client = reqwest::Client::new();

        let response = guard
            .call_http("payment", client.get(format!("http://{addr}/orders")))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
        assert_eq!(breakers.get("payment").unwrap().state(), CircuitState::Closed);
    }
}
