// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use serde_json::Value;

use crate::error::Result;
use crate::models::SourceConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &SourceConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// GET a URL and decode the body as JSON. Non-success statuses are errors.
pub async fn fetch_json(client: &reqwest::Client, url: &str) -> Result<Value> {
    let bytes = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    Ok(serde_json::from_slice(&bytes)?)
}
