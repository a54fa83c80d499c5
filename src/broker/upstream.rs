use std::time::Duration;

use http::StatusCode;
use reqwest::{multipart::Form, Client};
use serde_json::Value;
use thiserror::Error;

use crate::config::broker::{FormEncoding, UpstreamConfig};

/// Field of the upstream response body carrying the token.
pub const TOKEN_FIELD: &str = "Token";

#[derive(Debug, Error)]
pub enum UpstreamFailure {
    #[error("token endpoint timed out: {0}")]
    Timeout(reqwest::Error),
    #[error("token endpoint unreachable: {0}")]
    Transport(reqwest::Error),
    #[error("token endpoint responded with status {0}")]
    Status(StatusCode),
    #[error("token endpoint returned a malformed body: {0}")]
    Malformed(String),
}

impl UpstreamFailure {
    pub fn reason(&self) -> &'static str {
        match self {
            UpstreamFailure::Timeout(_) => "timeout",
            UpstreamFailure::Transport(_) => "transport",
            UpstreamFailure::Status(_) => "status",
            UpstreamFailure::Malformed(_) => "malformed",
        }
    }
}

impl From<reqwest::Error> for UpstreamFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamFailure::Timeout(e)
        } else {
            UpstreamFailure::Transport(e)
        }
    }
}

/// Client for the upstream token endpoint, bound to the fixed service credential.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    url: String,
    username: String,
    password: String,
    encoding: FormEncoding,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(client: Client, config: &UpstreamConfig, timeout: Duration) -> Self {
        Self {
            client,
            url: config.url.to_owned(),
            username: config.username.to_owned(),
            password: config.password.to_owned(),
            encoding: config.encoding,
            timeout,
        }
    }

    pub async fn request_token(&self) -> Result<String, UpstreamFailure> {
        let request = self.client.post(&self.url).timeout(self.timeout);
        let request = match self.encoding {
            FormEncoding::Multipart => request.multipart(
                Form::new()
                    .text("username", self.username.clone())
                    .text("password", self.password.clone()),
            ),
            FormEncoding::Urlencoded => request.form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ]),
        };

        let response = request.send().await?;
        if response.status() != StatusCode::OK {
            return Err(UpstreamFailure::Status(response.status()));
        }
        let body = response.text().await?;
        extract_token(&body)
    }
}

/// Only a non-empty string `Token` in a JSON object is accepted.
pub fn extract_token(body: &str) -> Result<String, UpstreamFailure> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| UpstreamFailure::Malformed(format!("invalid json: {}", e)))?;

    match value.get(TOKEN_FIELD) {
        Some(Value::String(token)) if !token.is_empty() => Ok(token.to_owned()),
        Some(_) => Err(UpstreamFailure::Malformed(format!(
            "field '{}' is not a non-empty string",
            TOKEN_FIELD
        ))),
        None => Err(UpstreamFailure::Malformed(format!(
            "field '{}' is absent",
            TOKEN_FIELD
        ))),
    }
}
