//! Caller-facing failures of the broker and their HTTP rendering.
//!
//! Broker-originated failures are rendered as `{ "ResultType": 0, "ResultMessage": .. }`.
//! Failures that carry a downstream response are passed through verbatim.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::forwarder::response::DownstreamResponse;

pub const TOKEN_FETCH_MESSAGE: &str = "Tokenabruf fehlgeschlagen";
pub const NETWORK_MESSAGE: &str =
    "Netzwerkfehler: Bitte überprüfen Sie Ihre Internetverbindung.";
pub const MISSING_CREDENTIALS_MESSAGE: &str = "E-Mail und Passwort sind erforderlich.";
pub const INVALID_BODY_MESSAGE: &str = "Ungültige Anfrage.";

#[derive(Debug, Error)]
pub enum BrokerError {
    /// Caller input rejected before the broker is involved.
    #[error("invalid caller input: {0}")]
    Input(String),

    #[error("token fetch failed: {0}")]
    TokenFetch(String),

    /// The single retry after a 401/403 was rejected again.
    #[error("downstream rejected refreshed token with status {}", .0.status)]
    AuthRetryExhausted(DownstreamResponse),

    #[error("downstream responded with status {}", .0.status)]
    Downstream(DownstreamResponse),

    #[error("network error talking to downstream: {0}")]
    Network(String),
}

impl BrokerError {
    /// Label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            BrokerError::Input(_) => "input",
            BrokerError::TokenFetch(_) => "token_fetch",
            BrokerError::AuthRetryExhausted(_) => "auth_retry_exhausted",
            BrokerError::Downstream(_) => "downstream",
            BrokerError::Network(_) => "network",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorBody {
    pub result_type: u8,
    pub result_message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            result_type: 0,
            result_message: message.into(),
        }
    }
}

impl IntoResponse for BrokerError {
    fn into_response(self) -> Response {
        match self {
            BrokerError::Input(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody::new(message))).into_response()
            }
            BrokerError::TokenFetch(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new(TOKEN_FETCH_MESSAGE)),
            )
                .into_response(),
            BrokerError::Network(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new(NETWORK_MESSAGE)),
            )
                .into_response(),
            BrokerError::AuthRetryExhausted(response) | BrokerError::Downstream(response) => {
                response.into_response()
            }
        }
    }
}
