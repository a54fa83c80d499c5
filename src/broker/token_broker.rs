use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::broker::upstream::UpstreamClient;
use crate::cache::token::TokenCredential;
use crate::cache::token_cache::TokenCache;
use crate::errors::BrokerError;
use crate::helpers::time::{get_instant, Clock};
use crate::observability::metrics::get_metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchTrigger {
    /// cache empty or stale
    Miss,
    /// downstream rejected the cached token
    Forced,
}

impl FetchTrigger {
    fn as_str(&self) -> &'static str {
        match self {
            FetchTrigger::Miss => "miss",
            FetchTrigger::Forced => "forced",
        }
    }
}

/// Hands out the service token, reusing the cached one while it is valid.
///
/// Concurrent callers that all miss the cache wait on one fetch guard and
/// re-check the cache once they hold it, so only the first of them reaches
/// the upstream endpoint.
#[derive(Debug)]
pub struct TokenBroker {
    cache: TokenCache,
    upstream: UpstreamClient,
    clock: Arc<dyn Clock>,
    cache_duration: chrono::Duration,
    fetch_guard: Mutex<()>,
}

impl TokenBroker {
    pub fn new(
        cache: TokenCache,
        upstream: UpstreamClient,
        clock: Arc<dyn Clock>,
        cache_duration: chrono::Duration,
    ) -> Self {
        Self {
            cache,
            upstream,
            clock,
            cache_duration,
            fetch_guard: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Cached token if still valid, otherwise a freshly fetched one.
    pub async fn get_token(&self) -> Result<TokenCredential, BrokerError> {
        let metrics = get_metrics().await;
        if let Some(credential) = self.usable_credential().await {
            metrics.cache_hits.inc();
            debug!("service token served from cache, expires at {}", credential.expires_at);
            return Ok(credential);
        }
        metrics.cache_misses.inc();

        let _guard = self.fetch_guard.lock().await;
        if let Some(credential) = self.usable_credential().await {
            debug!("service token fetched by a concurrent caller");
            return Ok(credential);
        }
        self.fetch(FetchTrigger::Miss).await
    }

    /// Fetch a new token regardless of the cache state.
    pub async fn force_refresh(&self) -> Result<TokenCredential, BrokerError> {
        let _guard = self.fetch_guard.lock().await;
        self.fetch(FetchTrigger::Forced).await
    }

    /// Drop the cached token after the downstream refused it.
    /// A token refreshed meanwhile by another request is kept.
    pub async fn invalidate(&self, rejected_token: &str) {
        match self.cache.clear_token(rejected_token).await {
            Some(credential) => {
                get_metrics().await.cache_invalidations.inc();
                info!("cached service token issued at {} invalidated", credential.issued_at);
            }
            None => debug!("rejected token no longer cached"),
        }
    }

    async fn usable_credential(&self) -> Option<TokenCredential> {
        let now = self.clock.now();
        self.cache
            .read()
            .await
            .filter(|credential| credential.is_valid_at(now))
    }

    async fn fetch(&self, trigger: FetchTrigger) -> Result<TokenCredential, BrokerError> {
        let metrics = get_metrics().await;
        let start = get_instant();
        metrics.upstream_fetch_requests.with_label_values(&[trigger.as_str()]).inc();
        info!("fetching service token from upstream, trigger: {}", trigger.as_str());

        let result = self.upstream.request_token().await;
        metrics
            .upstream_fetch_duration
            .with_label_values(&[trigger.as_str()])
            .observe(start.elapsed().as_secs_f64());

        match result {
            Ok(token) => {
                let credential = TokenCredential::new(token, self.clock.now(), self.cache_duration);
                self.cache.write(credential.clone()).await;
                info!("service token cached until {}", credential.expires_at);
                Ok(credential)
            }
            Err(failure) => {
                metrics.upstream_fetch_failures.with_label_values(&[failure.reason()]).inc();
                warn!("service token fetch failed: {}", failure);
                Err(BrokerError::TokenFetch(failure.to_string()))
            }
        }
    }
}
