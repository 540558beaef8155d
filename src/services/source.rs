//! Remote availability source.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::Result;
use crate::models::SourceConfig;
use crate::utils::http;

/// Anything that can hand back one raw availability payload.
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    /// Fetch the current payload. Transport and status failures are errors;
    /// the body shape is not checked here.
    async fn fetch(&self) -> Result<Value>;

    /// Where the payload comes from, for logs.
    fn describe(&self) -> String;
}

/// Plain GET against the configured endpoint.
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Build a client from config and point it at `base_url`.
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let client = http::create_client(config)?;
        Ok(Self::new(client, &config.base_url))
    }
}

#[async_trait]
impl AvailabilitySource for HttpSource {
    async fn fetch(&self) -> Result<Value> {
        log::debug!("GET {}", self.url);
        http::fetch_json(&self.client, &self.url).await
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
