//! # Login Broker Library
//!
//! Caches the service token of the upstream identity endpoint and forwards
//! login calls to the downstream API with that token, refreshing it once
//! when the downstream rejects it.
//!
//! Modules:
//! - `config`: service configuration, loading and validation
//! - `cache`: single-slot token storage
//! - `broker`: token reuse and upstream fetching
//! - `forwarder`: downstream calls with one-shot token recovery
//! - `server`: HTTP surface exposed to the app

pub mod broker;
pub mod cache;
pub mod config;
pub mod errors;
pub mod forwarder;
pub mod helpers;
pub mod observability;
pub mod server;
pub mod utils;
#[cfg(test)]
pub mod tests;

pub use crate::config::service::ServiceConfig;
pub use crate::errors::BrokerError;
