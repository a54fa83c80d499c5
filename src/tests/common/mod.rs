// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::routing::post;
use chrono::{DateTime, TimeZone, Utc};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use reqwest::Client;

use crate::broker::token_broker::TokenBroker;
use crate::broker::upstream::UpstreamClient;
use crate::cache::token_cache::TokenCache;
use crate::config::broker::{FormEncoding, UpstreamConfig};
use crate::config::settings::{MetricsConfig, ServerConfig, SettingsConfig};
use crate::forwarder::forwarder::RequestForwarder;
use crate::helpers::time::Clock;

pub const UPSTREAM_PATH: &str = "/rest/zmi/token";
pub const LOGIN_PATH: &str = "/rest/zmi/api/LoginMyBSSB";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

/// Address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

/// Clock moved by hand.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
        })
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub type Reply = (StatusCode, String);

/// POST endpoint that counts calls and answers with `reply(call_index, headers, body)`.
pub struct CountingServer {
    pub addr: SocketAddr,
    path: String,
    hits: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl CountingServer {
    pub async fn spawn<F>(path: &str, reply: F) -> Self
    where
        F: Fn(usize, &HeaderMap, &str) -> Reply + Send + Sync + 'static,
    {
        Self::spawn_delayed(path, Duration::ZERO, reply).await
    }

    pub async fn spawn_delayed<F>(path: &str, delay: Duration, reply: F) -> Self
    where
        F: Fn(usize, &HeaderMap, &str) -> Reply + Send + Sync + 'static,
    {
        let reply = Arc::new(reply);
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            path,
            post(move |headers: HeaderMap, body: String| {
                let reply = reply.clone();
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    let (status, body) = reply(n, &headers, &body);
                    (status, [(CONTENT_TYPE, "application/json")], body)
                }
            }),
        );
        let (handle, addr) = spawn_axum(router).await;
        Self {
            addr,
            path: path.to_owned(),
            hits,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}{}", self.addr, self.path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for CountingServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Upstream issuing `tok-1`, `tok-2`, ... on consecutive calls.
pub async fn sequential_upstream() -> CountingServer {
    CountingServer::spawn(UPSTREAM_PATH, |n, _, _| {
        (StatusCode::OK, json!({ "Token": format!("tok-{}", n + 1) }).to_string())
    })
    .await
}

/// Upstream that never issues a token.
pub async fn failing_upstream() -> CountingServer {
    CountingServer::spawn(UPSTREAM_PATH, |_, _, _| {
        (StatusCode::INTERNAL_SERVER_ERROR, "{}".to_owned())
    })
    .await
}

pub fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

pub fn upstream_config(url: &str, encoding: FormEncoding) -> UpstreamConfig {
    UpstreamConfig {
        url: url.to_owned(),
        username: "webUser".to_owned(),
        password: "secret".to_owned(),
        encoding,
        accept_invalid_certs: false,
    }
}

pub fn broker_with(
    upstream_url: &str,
    encoding: FormEncoding,
    clock: Arc<dyn Clock>,
    timeout: Duration,
) -> Arc<TokenBroker> {
    let upstream = UpstreamClient::new(
        build_reqwest_client(),
        &upstream_config(upstream_url, encoding),
        timeout,
    );
    Arc::new(TokenBroker::new(
        TokenCache::new(),
        upstream,
        clock,
        chrono::Duration::minutes(55),
    ))
}

pub fn broker_for(upstream_url: &str, clock: Arc<dyn Clock>) -> Arc<TokenBroker> {
    broker_with(upstream_url, FormEncoding::Urlencoded, clock, Duration::from_secs(5))
}

pub fn forwarder_for(broker: Arc<TokenBroker>, timeout: Duration) -> RequestForwarder {
    RequestForwarder::new(broker, build_reqwest_client(), timeout)
}

pub fn test_settings() -> SettingsConfig {
    SettingsConfig {
        metrics: MetricsConfig {
            path: "/metrics".to_owned(),
            is_enabled: true,
        },
        server: ServerConfig {
            host: "127.0.0.1".to_owned(),
            port: "0".to_owned(),
            login_route: "/login".to_owned(),
            token_route: "/bssb-token".to_owned(),
        },
        logging: None,
    }
}
