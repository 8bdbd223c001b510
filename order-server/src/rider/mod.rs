//! Rider access: bearer tokens and the scan gateway

pub mod gateway;
pub mod token;

pub use gateway::RiderGateway;
