use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use crate::broker::token_broker::TokenBroker;
use crate::broker::upstream::UpstreamClient;
use crate::cache::token_cache::TokenCache;
use crate::config::service::ServiceConfig;
use crate::config::settings::SettingsConfig;
use crate::forwarder::forwarder::RequestForwarder;
use crate::helpers::time::SystemClock;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::handlers;
use crate::utils::http_client;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub forwarder: Arc<RequestForwarder>,
    /// downstream login endpoint
    pub login_url: Arc<str>,
}

impl AppState {
    pub fn new(metrics: &Metrics, forwarder: Arc<RequestForwarder>, login_url: &str) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            forwarder,
            login_url: Arc::from(login_url),
        }
    }
}

/// Wire cache, broker and forwarder from the service configuration.
pub async fn build_state(service_config: &ServiceConfig) -> Result<AppState> {
    let timeout = service_config.broker.request_timeout();
    let upstream_client = http_client::build(timeout, service_config.upstream.accept_invalid_certs)?;
    let downstream_client = http_client::build(timeout, service_config.downstream.accept_invalid_certs)?;

    let broker = Arc::new(TokenBroker::new(
        TokenCache::new(),
        UpstreamClient::new(upstream_client, &service_config.upstream, timeout),
        Arc::new(SystemClock),
        service_config.broker.cache_duration(),
    ));
    let forwarder = Arc::new(RequestForwarder::new(broker, downstream_client, timeout));

    Ok(AppState::new(
        get_metrics().await,
        forwarder,
        &service_config.downstream.login_url(),
    ))
}

/// Build the broker router for the configured paths.
pub fn router(settings_config: &SettingsConfig, state: AppState) -> Router {
    let server = &settings_config.server;
    info!("served paths: {}, {}", server.login_route, server.token_route);

    Router::new()
        .route(&server.login_route, post(handlers::login))
        .route(&server.token_route, post(handlers::service_token))
        .route("/health", get(handlers::health))
        .merge(state.metrics_state.router(&settings_config.metrics))
        .with_state(state)
}

/// Serve until ctrl-c is received.
pub async fn start(settings_config: &SettingsConfig, state: AppState) -> Result<()> {
    let metrics = get_metrics().await;
    let app = router(settings_config, state);

    let bind_addr = &settings_config.server.host;
    let port = &settings_config.server.port;
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", bind_addr, port))
        .await
        .map_err(|e| anyhow!("cannot bind {}:{}: {}", bind_addr, port, e))?;
    info!("login broker listening on {}:{}", bind_addr, port);

    metrics.up.set(1);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    metrics.up.set(0);
    info!("login broker stopped");

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // no signal handler available, serve until the process is killed
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
