pub mod catalog;
pub mod circuit;
pub mod event;
pub mod health;
pub mod registry;

pub use catalog::{
    OrderConfirmed, OrderRefunded, PagePublished, ProductSubmitted, SchemaRegistry,
    UserRegistered, Validation, patterns,
};
pub use circuit::{CircuitActionResponse, CircuitStatus, ListCircuitsResponse};
pub use event::{Event, EventDecodeError, EventPayload};
pub use health::{
    CheckState, HealthReport, HealthState, LivenessReport, ReadinessReport, ReadyState,
};
pub use registry::{ListServicesResponse, ServiceDescriptor, ServiceHealth, ServiceStatus};
