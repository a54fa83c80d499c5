use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;

/// Per-call timeouts are set on each request, the client only bounds connecting.
pub fn build(connect_timeout: Duration, accept_invalid_certs: bool) -> Result<Client> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
        .map_err(|e| anyhow!("failed to build HTTP client: {}", e))
}
