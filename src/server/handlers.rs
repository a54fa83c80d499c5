use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::errors::{BrokerError, INVALID_BODY_MESSAGE, MISSING_CREDENTIALS_MESSAGE};
use crate::forwarder::request::ForwardRequest;
use crate::forwarder::response::DownstreamResponse;
use crate::server::server::AppState;

/// Login body sent by the app. Lower-case field names are accepted as well.
#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    #[serde(rename = "Email", alias = "email")]
    pub email: Option<String>,
    #[serde(rename = "Passwort", alias = "password")]
    pub passwort: Option<String>,
}

impl LoginPayload {
    fn credentials(&self) -> Option<(&str, &str)> {
        // blank emails are rejected, the value itself is forwarded as sent
        let email = self.email.as_deref().filter(|e| !e.trim().is_empty())?;
        let passwort = self.passwort.as_deref().filter(|p| !p.is_empty())?;
        Some((email, passwort))
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TokenBody {
    pub token: String,
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> Result<DownstreamResponse, BrokerError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!("rejected login body: {}", rejection);
        BrokerError::Input(INVALID_BODY_MESSAGE.to_owned())
    })?;
    let (email, passwort) = payload
        .credentials()
        .ok_or_else(|| BrokerError::Input(MISSING_CREDENTIALS_MESSAGE.to_owned()))?;

    let request = ForwardRequest::new(
        &*state.login_url,
        json!({ "Email": email, "Passwort": passwort }),
    );
    state.forwarder.forward(request).await.inspect_err(|e| match e {
        BrokerError::TokenFetch(_) | BrokerError::Network(_) => error!("login failed: {}", e),
        _ => warn!("login not accepted: {}", e),
    })
}

pub async fn service_token(State(state): State<AppState>) -> Result<Json<TokenBody>, BrokerError> {
    let credential = state
        .forwarder
        .broker()
        .get_token()
        .await
        .inspect_err(|e| error!("service token request failed: {}", e))?;
    Ok(Json(TokenBody {
        token: credential.token,
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
