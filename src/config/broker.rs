use std::time::Duration;

use serde::Deserialize;

pub const CACHE_DURATION_SECONDS_DEFAULT: u64 = 55 * 60;
pub const REQUEST_TIMEOUT_SECONDS_DEFAULT: u64 = 40;
/// upstream tokens live about an hour, a day is far beyond any sane cache duration
pub const CACHE_DURATION_SECONDS_MAX: u64 = 24 * 60 * 60;

/// ================================
/// Upstream token endpoint
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    pub url: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub encoding: FormEncoding,
    /// the internal token server runs with a self-signed certificate
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// How the service credential is encoded in the token request body.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FormEncoding {
    #[default]
    Multipart,
    Urlencoded,
}

/// ================================
/// Downstream resource endpoint
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct DownstreamConfig {
    pub base_url: String,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl DownstreamConfig {
    pub fn login_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.login_path.trim_start_matches('/')
        )
    }
}

/// ================================
/// Broker timings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct BrokerConfig {
    /// must stay below the upstream token lifetime
    #[serde(default = "default_cache_duration_seconds")]
    pub cache_duration_seconds: u64,
    /// applies to every upstream and downstream call
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl BrokerConfig {
    pub fn cache_duration(&self) -> chrono::Duration {
        i64::try_from(self.cache_duration_seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            cache_duration_seconds: CACHE_DURATION_SECONDS_DEFAULT,
            request_timeout_seconds: REQUEST_TIMEOUT_SECONDS_DEFAULT,
        }
    }
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_cache_duration_seconds() -> u64 {
    CACHE_DURATION_SECONDS_DEFAULT
}

fn default_request_timeout_seconds() -> u64 {
    REQUEST_TIMEOUT_SECONDS_DEFAULT
}
