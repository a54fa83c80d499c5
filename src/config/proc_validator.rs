//! Configuration validation with aggregated errors.
//! Every issue is collected so a broken config is reported in one pass.

use reqwest::Url;
use tracing::{error, info};

use crate::config::broker::{BrokerConfig, DownstreamConfig, UpstreamConfig, CACHE_DURATION_SECONDS_MAX};
use crate::config::service::ServiceConfig;
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::get_metrics;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_upstream(&cfg.upstream, &mut errors);
    validate_downstream(&cfg.downstream, &mut errors);
    validate_broker(&cfg.broker, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        get_metrics().await.config_validation_errors.inc();
        Err(errors)
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.server.host.is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be a valid port number",
            settings.server.port
        ));
    }
    validate_route("settings.server.login_route", &settings.server.login_route, errors);
    validate_route("settings.server.token_route", &settings.server.token_route, errors);
    if settings.server.login_route == settings.server.token_route {
        errors.push(format!(
            "settings.server.login_route and settings.server.token_route both use '{}'",
            settings.server.login_route
        ));
    }

    if settings.metrics.is_enabled {
        validate_route("settings.metrics.path", &settings.metrics.path, errors);
    }

    if let Some(logging) = &settings.logging {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' must be one of {:?}",
                logging.level, LOG_LEVELS
            ));
        }
    }
}

fn validate_upstream(upstream: &UpstreamConfig, errors: &mut Vec<String>) {
    validate_url("upstream.url", &upstream.url, errors);
    if upstream.username.trim().is_empty() {
        errors.push("upstream.username must not be empty".to_string());
    }
}

fn validate_downstream(downstream: &DownstreamConfig, errors: &mut Vec<String>) {
    validate_url("downstream.base_url", &downstream.base_url, errors);
}

fn validate_broker(broker: &BrokerConfig, errors: &mut Vec<String>) {
    if broker.cache_duration_seconds == 0 {
        errors.push("broker.cache_duration_seconds must be greater than 0".to_string());
    } else if broker.cache_duration_seconds > CACHE_DURATION_SECONDS_MAX {
        errors.push(format!(
            "broker.cache_duration_seconds ({}) must not exceed {}",
            broker.cache_duration_seconds, CACHE_DURATION_SECONDS_MAX
        ));
    }
    if broker.request_timeout_seconds == 0 {
        errors.push("broker.request_timeout_seconds must be greater than 0".to_string());
    }
}

fn validate_url(field: &str, value: &str, errors: &mut Vec<String>) {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(format!(
            "{} '{}' has unsupported scheme '{}'",
            field,
            value,
            url.scheme()
        )),
        Err(e) => errors.push(format!("{} '{}' is not a valid URL: {}", field, value, e)),
    }
}

fn validate_route(field: &str, value: &str, errors: &mut Vec<String>) {
    if !value.starts_with('/') {
        errors.push(format!("{} '{}' must start with '/'", field, value));
    }
}
