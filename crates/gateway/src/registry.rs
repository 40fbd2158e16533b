use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::info;

use agora_core::{ServiceDescriptor, ServiceHealth, ServiceStatus};

/// Last polled observation for a single service.
#[derive(Debug, Clone)]
struct Observation {
    status: ServiceStatus,
    last_checked_at: Option<DateTime<Utc>>,
}

struct ServiceEntry {
    descriptor: ServiceDescriptor,
    observation: RwLock<Observation>,
}

/// Registry of backend services known to the gateway.
///
/// The set of services is fixed at startup from configuration; only the
/// polled observations mutate afterwards. Every service starts `Unknown`
/// until the first poll completes.
pub struct ServiceRegistry {
    entries: HashMap<String, ServiceEntry>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a service, replacing any existing entry with the same name.
    pub fn register(&mut self, descriptor: ServiceDescriptor) {
        let entry = ServiceEntry {
            descriptor: descriptor.clone(),
            observation: RwLock::new(Observation {
                status: ServiceStatus::Unknown,
                last_checked_at: None,
            }),
        };
        self.entries.insert(descriptor.name.clone(), entry);
    }

    /// Descriptors of all registered services, sorted by name.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        let mut descriptors: Vec<ServiceDescriptor> = self
            .entries
            .values()
            .map(|entry| entry.descriptor.clone())
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Record a polled observation for a service, stamping the check time.
    ///
    /// Status changes are logged; steady-state observations are not.
    /// Returns the previous status, or `None` if the service is unknown.
    pub fn record_observation(&self, name: &str, status: ServiceStatus) -> Option<ServiceStatus> {
        let entry = self.entries.get(name)?;
        let mut observation = entry
            .observation
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let previous = observation.status;
        observation.status = status;
        observation.last_checked_at = Some(Utc::now());
        drop(observation);

        if previous != status {
            info!(
                service = %name,
                from = %previous,
                to = %status,
                "service status changed"
            );
        }
        Some(previous)
    }

    /// Current health view of a single service.
    pub fn status_of(&self, name: &str) -> Option<ServiceHealth> {
        let entry = self.entries.get(name)?;
        let observation = entry
            .observation
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Some(ServiceHealth {
            name: entry.descriptor.name.clone(),
            status: observation.status,
            last_checked_at: observation.last_checked_at,
        })
    }

    /// Health views of all registered services, sorted by name.
    pub fn statuses(&self) -> Vec<ServiceHealth> {
        let mut statuses: Vec<ServiceHealth> = self
            .entries
            .values()
            .map(|entry| {
                let observation = entry
                    .observation
                    .read()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                ServiceHealth {
                    name: entry.descriptor.name.clone(),
                    status: observation.status,
                    last_checked_at: observation.last_checked_at,
                }
            })
            .collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }

    /// Names of all registered services, sorted.
    pub fn services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.services())
            .finish()
    }
}
