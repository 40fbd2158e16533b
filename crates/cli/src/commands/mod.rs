pub mod circuits;
pub mod services;
pub mod smoke;
