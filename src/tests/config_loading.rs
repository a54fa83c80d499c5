use std::io::Write;

use serial_test::serial;

use crate::config::broker::FormEncoding;
use crate::config::proc_loader::{expand_env_vars, file_to_config, parse_config};
use crate::config::settings::LogFormat;
use crate::utils::logging::{resolve_logging_config, LogLevel};

const MINIMAL: &str = r#"
settings:
  server:
    host: 127.0.0.1
    port: "3002"
upstream:
  url: https://webintern.example:56400/rest/zmi/token
  username: webUser
  password: secret
downstream:
  base_url: https://webintern.example:56400/rest/zmi/api/
  login_path: /LoginMyBSSB
"#;

#[tokio::test]
async fn minimal_config_gets_defaults() {
    let cfg = parse_config(MINIMAL.to_owned()).await.unwrap();

    assert_eq!(cfg.broker.cache_duration_seconds, 55 * 60);
    assert_eq!(cfg.broker.request_timeout_seconds, 40);
    assert_eq!(cfg.broker.cache_duration(), chrono::Duration::minutes(55));
    assert_eq!(cfg.broker.request_timeout(), std::time::Duration::from_secs(40));
    assert_eq!(cfg.upstream.encoding, FormEncoding::Multipart);
    assert!(!cfg.upstream.accept_invalid_certs);
    assert_eq!(cfg.settings.server.login_route, "/login");
    assert_eq!(cfg.settings.server.token_route, "/bssb-token");
    assert!(!cfg.settings.metrics.is_enabled);

    let logging = cfg.settings.logging.clone().unwrap();
    assert_eq!(logging.level, "info");
    assert_eq!(logging.format, LogFormat::Compact);
}

#[tokio::test]
async fn login_url_joins_base_and_path() {
    let cfg = parse_config(MINIMAL.to_owned()).await.unwrap();
    assert_eq!(
        cfg.downstream.login_url(),
        "https://webintern.example:56400/rest/zmi/api/LoginMyBSSB"
    );
}

#[tokio::test]
async fn invalid_values_are_reported_together() {
    let content = r#"
settings:
  server:
    host: 127.0.0.1
    port: "not-a-port"
  logging:
    level: loud
    format: json
upstream:
  url: not a url
  username: ""
downstream:
  base_url: ftp://files.example
broker:
  cache_duration_seconds: 0
  request_timeout_seconds: 0
"#;
    let err = parse_config(content.to_owned()).await.unwrap_err().to_string();

    assert!(err.contains("total errors: 7"), "{}", err);
    assert!(err.contains("settings.server.port"));
    assert!(err.contains("settings.logging.level"));
    assert!(err.contains("upstream.url"));
    assert!(err.contains("upstream.username"));
    assert!(err.contains("downstream.base_url"));
    assert!(err.contains("broker.cache_duration_seconds"));
    assert!(err.contains("broker.request_timeout_seconds"));
}

#[tokio::test]
async fn oversized_cache_duration_is_rejected() {
    for seconds in ["86401", "1000000000000000", "18446744073709551615"] {
        let content = format!("{}broker:\n  cache_duration_seconds: {}\n", MINIMAL, seconds);
        let err = parse_config(content).await.unwrap_err().to_string();
        assert!(err.contains("total errors: 1"), "{}", err);
        assert!(err.contains("broker.cache_duration_seconds"), "{}", err);
    }

    let content = format!("{}broker:\n  cache_duration_seconds: 86400\n", MINIMAL);
    let cfg = parse_config(content).await.unwrap();
    assert_eq!(cfg.broker.cache_duration(), chrono::Duration::days(1));
}

#[test]
fn cache_duration_beyond_i64_saturates() {
    let broker = crate::config::broker::BrokerConfig {
        cache_duration_seconds: u64::MAX,
        request_timeout_seconds: 40,
    };
    assert_eq!(broker.cache_duration(), chrono::Duration::MAX);
}

#[tokio::test]
async fn unknown_encoding_fails_to_parse() {
    let content = MINIMAL.replace("password: secret", "password: secret\n  encoding: xml");
    assert!(parse_config(content).await.is_err());
}

#[test]
#[serial]
fn env_placeholders_are_expanded() {
    std::env::set_var("LOGIN_BROKER_TEST_USER", "configured");
    std::env::remove_var("LOGIN_BROKER_TEST_MISSING");

    let expanded = expand_env_vars(
        "a: ${LOGIN_BROKER_TEST_USER}\nb: ${LOGIN_BROKER_TEST_MISSING:https://fallback:443/x}\nc: \"${LOGIN_BROKER_TEST_MISSING}\"\nd: \"${LOGIN_BROKER_TEST_MISSING:}\"",
    );

    assert_eq!(
        expanded,
        "a: configured\nb: https://fallback:443/x\nc: \"\"\nd: \"\""
    );
    std::env::remove_var("LOGIN_BROKER_TEST_USER");
}

#[tokio::test]
#[serial]
async fn config_file_is_loaded_with_env_overrides() {
    std::env::set_var("LOGIN_BROKER_TEST_PASSWORD", "from-env");
    std::env::remove_var("LOGIN_BROKER_TEST_PORT");

    let content = MINIMAL
        .replace("port: \"3002\"", "port: \"${LOGIN_BROKER_TEST_PORT:3100}\"")
        .replace("password: secret", "password: \"${LOGIN_BROKER_TEST_PASSWORD}\"");
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();

    let cfg = file_to_config(file.path()).await.unwrap();

    assert_eq!(cfg.settings.server.port, "3100");
    assert_eq!(cfg.upstream.password, "from-env");
    std::env::remove_var("LOGIN_BROKER_TEST_PASSWORD");
}

#[tokio::test]
async fn missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = file_to_config(&dir.path().join("absent.yaml")).await.unwrap_err();
    assert!(err.to_string().contains("cannot read config"));
}

#[tokio::test]
async fn cli_log_level_overrides_config() {
    let cfg = parse_config(MINIMAL.to_owned()).await.unwrap();

    let from_config = resolve_logging_config(&cfg, None);
    assert_eq!(from_config.level, "info");

    let from_cli = resolve_logging_config(&cfg, Some(LogLevel::DEBUG));
    assert_eq!(from_cli.level, "debug");
    assert_eq!(from_cli.format, LogFormat::Compact);
}
