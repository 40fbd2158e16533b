//! Shared runtime for Agora backend services.
//!
//! Each marketplace service links this crate for its configuration,
//! store and bus wiring, and the uniform `/health` surface the gateway
//! polls. See `examples/demo.rs` for a complete service.

pub mod config;
pub mod context;
pub mod dependency;
pub mod error;
pub mod health;
pub mod runtime;

pub use config::ServiceConfig;
pub use context::ServiceContext;
pub use dependency::Dependency;
pub use error::ServiceError;
pub use health::health_router;
pub use runtime::{Service, bootstrap, serve, shutdown_signal};
