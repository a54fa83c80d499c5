use std::sync::Arc;
use std::time::Duration;

use http::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::broker::token_broker::TokenBroker;
use crate::errors::BrokerError;
use crate::forwarder::request::ForwardRequest;
use crate::forwarder::response::DownstreamResponse;
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;

const SUCCESS_MSG: &str = "success";

/// Performs downstream calls with the broker's token and recovers once from
/// a rejected token.
#[derive(Debug, Clone)]
pub struct RequestForwarder {
    broker: Arc<TokenBroker>,
    client: Client,
    timeout: Duration,
}

impl RequestForwarder {
    pub fn new(broker: Arc<TokenBroker>, client: Client, timeout: Duration) -> Self {
        Self {
            broker,
            client,
            timeout,
        }
    }

    pub fn broker(&self) -> &Arc<TokenBroker> {
        &self.broker
    }

    pub async fn forward(&self, mut request: ForwardRequest) -> Result<DownstreamResponse, BrokerError> {
        let metrics = get_metrics().await;
        let start = get_instant();

        let result = self.run(&mut request).await;

        let outcome = match &result {
            Ok(_) => SUCCESS_MSG,
            Err(e) => e.kind(),
        };
        metrics.forward_outcomes.with_label_values(&[outcome]).inc();
        metrics
            .forward_duration
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());
        info!(
            "forward to '{}' finished: {}, retries: {}",
            request.endpoint(),
            outcome,
            request.attempt_count()
        );
        result
    }

    async fn run(&self, request: &mut ForwardRequest) -> Result<DownstreamResponse, BrokerError> {
        let credential = self.broker.get_token().await?;
        let first = self.send(request, &credential.token).await?;
        if !first.is_auth_failure() {
            return settle(first);
        }

        let Some(_) = request.advance() else {
            return Err(BrokerError::AuthRetryExhausted(first));
        };
        warn!("downstream rejected service token with {}, refreshing", first.status);
        get_metrics().await.auth_retries.inc();

        self.broker.invalidate(&credential.token).await;
        let credential = self.broker.force_refresh().await?;
        let second = self.send(request, &credential.token).await?;
        if second.is_auth_failure() {
            warn!("downstream rejected refreshed token with {}", second.status);
            return Err(BrokerError::AuthRetryExhausted(second));
        }
        settle(second)
    }

    async fn send(&self, request: &mut ForwardRequest, token: &str) -> Result<DownstreamResponse, BrokerError> {
        request.present(token);
        get_metrics()
            .await
            .downstream_requests
            .with_label_values(&[request.attempt().as_str()])
            .inc();

        let response = self
            .client
            .post(request.endpoint())
            .bearer_auth(token)
            .json(request.payload())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.bytes().await.map_err(network_error)?;
        debug!(
            "downstream responded {} on {} attempt",
            status,
            request.attempt().as_str()
        );
        Ok(DownstreamResponse::new(status, content_type, body))
    }
}

fn settle(response: DownstreamResponse) -> Result<DownstreamResponse, BrokerError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(BrokerError::Downstream(response))
    }
}

fn network_error(e: reqwest::Error) -> BrokerError {
    if e.is_timeout() {
        warn!("downstream call timed out: {}", e);
    } else {
        warn!("downstream call failed: {}", e);
    }
    BrokerError::Network(e.to_string())
}
