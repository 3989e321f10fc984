//! HTTP fetcher backed by `reqwest`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::Client;
use tracing::debug;

use super::config::FetchConfig;
use super::protocols::{FetchResult, Fetcher};
use crate::errors::{FetchError, ScraperError};
use crate::observability::SpanTimer;

/// Fetches pages over HTTP with a browser-like identification header.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Builds a fetcher from configuration.
    pub fn new(config: FetchConfig) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| ScraperError::internal(format!("invalid header name '{key}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ScraperError::internal(format!("invalid header value for '{key}': {e}")))?;
            headers.insert(name, value);
        }

        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .redirect(Policy::limited(config.max_redirects));
        if let Some(timeout) = config.timeout()? {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ScraperError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Creates a fetcher with default configuration.
    pub fn with_defaults() -> Result<Self, ScraperError> {
        Self::new(FetchConfig::default())
    }

    /// Gets the configuration.
    #[must_use]
    pub const fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult, ScraperError> {
        let timer = SpanTimer::start("fetch");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::new(url, e.to_string()))?;

        let status_code = response.status().as_u16();
        if self.config.reject_error_status && !response.status().is_success() {
            return Err(FetchError::new(url, format!("HTTP {status_code}"))
                .with_status(status_code)
                .into());
        }

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::new(url, e.to_string()).with_status(status_code))?;

        let duration_ms = timer.finish();
        debug!(url = %url, status_code, duration_ms, bytes = text.len(), "Fetched page");

        Ok(FetchResult::new(status_code, text))
    }
}
