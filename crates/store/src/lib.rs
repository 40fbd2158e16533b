pub mod config;
pub mod connector;
pub mod error;

pub use config::StoreConfig;
pub use connector::{ConnectionState, StoreConnector};
pub use error::StoreError;
