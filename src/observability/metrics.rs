use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Upstream token endpoint
    pub upstream_fetch_requests: IntCounterVec,
    pub upstream_fetch_failures: IntCounterVec,
    pub upstream_fetch_duration: HistogramVec,

    // Cache
    pub cache_hits: IntCounter,
    pub cache_misses: IntCounter,
    pub cache_invalidations: IntCounter,

    // Downstream forwarding
    pub downstream_requests: IntCounterVec,
    pub forward_outcomes: IntCounterVec,
    pub auth_retries: IntCounter,
    pub forward_duration: HistogramVec,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("loginbroker".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Upstream
            upstream_fetch_requests: IntCounterVec::new(Opts::new("upstream_fetch_requests_total", "Token fetch attempts against the upstream endpoint"),&["trigger"],).unwrap(),
            upstream_fetch_failures: IntCounterVec::new(Opts::new("upstream_fetch_failures_total", "Token fetch failures by reason"),&["reason"],).unwrap(),
            upstream_fetch_duration: HistogramVec::new(HistogramOpts::new("upstream_fetch_duration_seconds", "Token fetch duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),&["trigger"],).unwrap(),

            // Cache
            cache_hits: IntCounter::new("cache_hits_total", "Token requests served from cache").unwrap(),
            cache_misses: IntCounter::new("cache_misses_total", "Token requests that found no usable cached token").unwrap(),
            cache_invalidations: IntCounter::new("cache_invalidations_total", "Cached tokens cleared after a downstream auth failure").unwrap(),

            // Downstream
            downstream_requests: IntCounterVec::new(Opts::new("downstream_requests_total", "Downstream calls by attempt"),&["attempt"],).unwrap(),
            forward_outcomes: IntCounterVec::new(Opts::new("forward_outcomes_total", "Final forward outcomes by kind"),&["outcome"],).unwrap(),
            auth_retries: IntCounter::new("auth_retries_total", "Downstream calls retried after 401/403").unwrap(),
            forward_duration: HistogramVec::new(HistogramOpts::new("forward_duration_seconds", "End-to-end forward duration seconds").buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 40.0]),&["outcome"],).unwrap(),

            // Config/runtime
            config_validation_errors: IntCounter::new("config_validation_errors_total","Validation errors during startup",).unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.upstream_fetch_requests.clone())).unwrap();
        reg.register(Box::new(metrics.upstream_fetch_failures.clone())).unwrap();
        reg.register(Box::new(metrics.upstream_fetch_duration.clone())).unwrap();
        reg.register(Box::new(metrics.cache_hits.clone())).unwrap();
        reg.register(Box::new(metrics.cache_misses.clone())).unwrap();
        reg.register(Box::new(metrics.cache_invalidations.clone())).unwrap();
        reg.register(Box::new(metrics.downstream_requests.clone())).unwrap();
        reg.register(Box::new(metrics.forward_outcomes.clone())).unwrap();
        reg.register(Box::new(metrics.auth_retries.clone())).unwrap();
        reg.register(Box::new(metrics.forward_duration.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
