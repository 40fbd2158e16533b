pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;

pub use client::{BusMode, EventBusClient, RpcRequest, Subscription};
pub use config::{BROKER_URL_ENV, BusConfig};
pub use dispatch::{EventDispatcher, HandlerResult};
pub use error::BusError;
