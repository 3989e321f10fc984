//! Protocol traits for websearch components.
//!
//! These traits define the seams between fetching, searching and extraction,
//! allowing the orchestrator to run against real HTTP or test doubles.

use async_trait::async_trait;

use super::models::{Record, SearchResult};
use crate::errors::ScraperError;

/// A fetched response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// HTTP status code.
    pub status_code: u16,
    /// Response body as text.
    pub text: String,
}

impl FetchResult {
    /// Creates a result.
    #[must_use]
    pub fn new(status_code: u16, text: impl Into<String>) -> Self {
        Self {
            status_code,
            text: text.into(),
        }
    }

    /// Creates a 200 result, mostly useful for test doubles.
    #[must_use]
    pub fn ok(text: impl Into<String>) -> Self {
        Self::new(200, text)
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status_code >= 200 && self.status_code < 300
    }
}

/// Protocol for HTTP fetching.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches a URL and returns the result.
    async fn fetch(&self, url: &str) -> Result<FetchResult, ScraperError>;
}

/// Protocol for turning a search term into candidate URLs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResultFinder: Send + Sync {
    /// Runs the query and returns results in relevance order.
    async fn find(&self, query: &str) -> Result<Vec<SearchResult>, ScraperError>;
}

/// Protocol for deriving a record from a URL.
#[async_trait]
pub trait PageExtractor: Send + Sync {
    /// The record type produced.
    type Record: Record;

    /// Fetches the URL and extracts a record from it.
    async fn extract(&self, url: &str) -> Result<Self::Record, ScraperError>;
}
