use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info};

use agora_core::{ServiceDescriptor, ServiceStatus};

use crate::error::GatewayError;
use crate::metrics::GatewayMetrics;
use crate::registry::ServiceRegistry;

/// Configuration for the health poller.
#[derive(Debug, Clone)]
pub struct HealthPollerConfig {
    /// How often to poll the full set of registered services.
    pub poll_interval: Duration,
    /// Per-probe request timeout.
    pub probe_timeout: Duration,
}

impl HealthPollerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.poll_interval.is_zero() {
            return Err(GatewayError::Configuration(
                "poll_interval must be greater than zero".into(),
            ));
        }
        if self.probe_timeout.is_zero() {
            return Err(GatewayError::Configuration(
                "probe_timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for HealthPollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(2),
        }
    }
}

/// Background worker that polls every registered service's readiness
/// endpoint and records observations in the [`ServiceRegistry`].
///
/// Probes within one cycle run concurrently; a slow service delays its
/// own classification but not the others. A `200` marks the service
/// `healthy`, any other response `degraded`, and a timeout or connection
/// error `unreachable`.
pub struct HealthPoller {
    registry: Arc<ServiceRegistry>,
    metrics: Arc<GatewayMetrics>,
    http: reqwest::Client,
    poll_interval: Duration,
    shutdown_rx: mpsc::Receiver<()>,
}

impl HealthPoller {
    /// Create a poller over the given registry.
    pub fn new(
        registry: Arc<ServiceRegistry>,
        metrics: Arc<GatewayMetrics>,
        config: &HealthPollerConfig,
        shutdown_rx: mpsc::Receiver<()>,
    ) -> Result<Self, GatewayError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.probe_timeout)
            .build()?;
        Ok(Self {
            registry,
            metrics,
            http,
            poll_interval: config.poll_interval,
            shutdown_rx,
        })
    }

    /// Run the poller until shutdown is signaled.
    ///
    /// The first cycle fires immediately so statuses populate without
    /// waiting a full interval after startup.
    pub async fn run(mut self) {
        let poll_interval_ms = self.poll_interval.as_millis();
        info!(
            services = self.registry.len(),
            poll_interval_ms, "health poller starting"
        );

        let mut ticker = interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("health poller received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
            }
        }
    }

    /// Execute one poll cycle: probe every service concurrently and record
    /// the observations.
    pub async fn poll_once(&self) {
        let descriptors = self.registry.descriptors();
        let probes = descriptors.into_iter().map(|descriptor| async move {
            let status = self.probe(&descriptor).await;
            (descriptor, status)
        });

        for (descriptor, status) in join_all(probes).await {
            if status != ServiceStatus::Healthy {
                self.metrics.increment_probe_failures();
            }
            self.registry.record_observation(&descriptor.name, status);
        }
        self.metrics.increment_polls();
    }

    async fn probe(&self, descriptor: &ServiceDescriptor) -> ServiceStatus {
        let url = descriptor.health_url();
        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => ServiceStatus::Healthy,
            Ok(response) => {
                debug!(
                    service = %descriptor.name,
                    status = %response.status(),
                    "readiness probe returned non-success"
                );
                ServiceStatus::Degraded
            }
            Err(e) if e.is_timeout() => {
                debug!(service = %descriptor.name, "readiness probe timed out");
                ServiceStatus::Unreachable
            }
            Err(e) => {
                debug!(service = %descriptor.name, error = %e, "readiness probe failed");
                ServiceStatus::Unreachable
            }
        }
    }
}
