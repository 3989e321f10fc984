//! Test doubles for fetchers and result finders.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::errors::{FetchError, ScraperError};
use crate::websearch::{FetchResult, Fetcher, ResultFinder, SearchResult};

/// A fetcher serving canned pages and counting requests per URL.
///
/// URLs without a registered page fail with a recoverable [`FetchError`].
#[derive(Debug, Default)]
pub struct MockFetcher {
    pages: HashMap<String, String>,
    failures: HashMap<String, String>,
    calls: Mutex<HashMap<String, usize>>,
}

impl MockFetcher {
    /// Creates a fetcher with no pages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` for `url`.
    #[must_use]
    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }

    /// Fails requests for `url` with `message`.
    #[must_use]
    pub fn with_failure(mut self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(url.into(), message.into());
        self
    }

    /// Returns how many times `url` was requested.
    #[must_use]
    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().get(url).copied().unwrap_or(0)
    }

    /// Returns the total number of requests.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    /// Clears the request counters.
    pub fn reset(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult, ScraperError> {
        *self.calls.lock().entry(url.to_string()).or_insert(0) += 1;

        if let Some(message) = self.failures.get(url) {
            return Err(FetchError::new(url, message.clone()).into());
        }
        self.pages
            .get(url)
            .map(|body| FetchResult::ok(body.clone()))
            .ok_or_else(|| FetchError::new(url, "no page registered").with_status(404).into())
    }
}

/// A result finder returning the same results for every query.
#[derive(Debug, Default)]
pub struct StaticResultFinder {
    results: Vec<SearchResult>,
    queries: Mutex<Vec<String>>,
}

impl StaticResultFinder {
    /// Returns `results` for every query.
    #[must_use]
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Returns snippet-less results for the given URLs.
    #[must_use]
    pub fn from_urls(urls: &[&str]) -> Self {
        Self::new(urls.iter().map(|url| SearchResult::new(*url)).collect())
    }

    /// Returns the queries received so far.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl ResultFinder for StaticResultFinder {
    async fn find(&self, query: &str) -> Result<Vec<SearchResult>, ScraperError> {
        self.queries.lock().push(query.to_string());
        Ok(self.results.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fetcher_counts_calls() {
        let fetcher = MockFetcher::new()
            .with_page("http://a.test", "<p>A</p>")
            .with_failure("http://down.test", "connection refused");

        let page = fetcher.fetch("http://a.test").await.unwrap();
        assert_eq!(page.text, "<p>A</p>");
        assert!(fetcher.fetch("http://down.test").await.is_err());
        assert!(fetcher.fetch("http://unknown.test").await.unwrap_err().is_recoverable());

        assert_eq!(fetcher.call_count("http://a.test"), 1);
        assert_eq!(fetcher.total_calls(), 3);
        fetcher.reset();
        assert_eq!(fetcher.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_static_finder_records_queries() {
        let finder = StaticResultFinder::from_urls(&["http://a.test"]);
        let results = finder.find("rust").await.unwrap();
        assert_eq!(results, vec![SearchResult::new("http://a.test")]);
        assert_eq!(finder.queries(), vec!["rust".to_string()]);
    }
}
