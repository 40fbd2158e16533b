pub mod circuit_breaker;
pub mod error;
pub mod guard;
pub mod metrics;
pub mod poller;
pub mod registry;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState,
};
pub use error::GatewayError;
pub use guard::{CallError, CircuitGuard, HttpCallError};
pub use metrics::{GatewayMetrics, MetricsSnapshot};
pub use poller::{HealthPoller, HealthPollerConfig};
pub use registry::ServiceRegistry;
