use std::sync::Arc;
use std::time::Instant;

use agora_core::{CheckState, HealthReport, HealthState, ReadinessReport};

use crate::dependency::Dependency;

/// Per-service runtime state backing the health surface.
///
/// Holds the service name, the process start time, and the registered
/// dependencies in registration order.
pub struct ServiceContext {
    name: String,
    started_at: Instant,
    dependencies: Vec<Arc<dyn Dependency>>,
}

impl ServiceContext {
    /// Create a context for the named service; uptime counts from here.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started_at: Instant::now(),
            dependencies: Vec::new(),
        }
    }

    /// Register a dependency that gates readiness.
    #[must_use]
    pub fn with_dependency(mut self, dependency: Arc<dyn Dependency>) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// The service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whole seconds since the context was created.
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Full health report: every dependency is probed and listed.
    pub async fn health(&self) -> HealthReport {
        let mut checks = std::collections::BTreeMap::new();
        let mut all_ok = true;
        for dependency in &self.dependencies {
            let available = dependency.is_available().await;
            all_ok &= available;
            let state = if available {
                CheckState::Ok
            } else {
                CheckState::Error
            };
            checks.insert(dependency.name().to_string(), state);
        }

        HealthReport {
            status: if all_ok {
                HealthState::Ok
            } else {
                HealthState::Degraded
            },
            service: self.name.clone(),
            uptime: self.uptime_secs(),
            checks,
        }
    }

    /// Readiness report: the first unavailable dependency, in registration
    /// order, is named in the reason.
    pub async fn readiness(&self) -> ReadinessReport {
        for dependency in &self.dependencies {
            if !dependency.is_available().await {
                return ReadinessReport::not_ready(format!("{} unavailable", dependency.name()));
            }
        }
        ReadinessReport::ready()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.dependencies.iter().map(|d| d.name()).collect();
        f.debug_struct("ServiceContext")
            .field("name", &self.name)
            .field("dependencies", &names)
            .finish()
    }
}
