use serde::Deserialize;

use crate::config::broker::{BrokerConfig, DownstreamConfig, UpstreamConfig};
use crate::config::settings::SettingsConfig;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub settings: SettingsConfig,
    pub upstream: UpstreamConfig,
    pub downstream: DownstreamConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
}
