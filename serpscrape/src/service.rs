//! Request handlers for the three external operations.
//!
//! Handlers take a JSON request body and return a JSON response or a
//! [`ServiceError`] carrying an HTTP-style status. Client errors keep their
//! message; everything else is logged and reported as a bare 500.

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

use crate::errors::{ScraperError, ValidationError};
use crate::pipeline::{validate_search, Scraper};

/// Detail returned for every non-client failure.
pub const INTERNAL_ERROR_DETAIL: &str = "Internal server error";

/// Greeting returned by [`welcome`].
pub const WELCOME_MESSAGE: &str =
    "Welcome to the web scraping API. Use scrape to collect structured pages, extract for articles and data to page through results.";

/// A failed request.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{status}: {detail}")]
pub struct ServiceError {
    /// HTTP-style status code.
    pub status: u16,
    /// Message for the caller.
    pub detail: String,
}

impl ServiceError {
    /// A 400 response.
    #[must_use]
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: 400,
            detail: detail.into(),
        }
    }

    /// A 500 response with no detail about the cause.
    #[must_use]
    pub fn internal() -> Self {
        Self {
            status: 500,
            detail: INTERNAL_ERROR_DETAIL.to_string(),
        }
    }

    /// Converts a scraper error raised while handling `operation`.
    #[must_use]
    pub fn from_scraper(operation: &str, err: &ScraperError) -> Self {
        if err.is_client_error() {
            return Self::bad_request(err.to_string());
        }
        error!(operation, kind = %err.kind(), error = %err, "Request failed");
        Self::internal()
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.message)
    }
}

fn search_term(request: &Value) -> Result<&str, ServiceError> {
    let search = request.get("search").and_then(Value::as_str).unwrap_or("");
    Ok(validate_search(search)?)
}

fn positive_field(request: &Value, field: &str) -> Result<u64, ServiceError> {
    match request.get(field) {
        None | Some(Value::Null) => Err(ValidationError::missing(field).into()),
        Some(value) => value
            .as_u64()
            .filter(|n| *n > 0)
            .ok_or_else(|| ValidationError::new(field, format!("{field} must be a positive integer")).into()),
    }
}

fn to_json<T: Serialize>(operation: &str, value: &T) -> Result<Value, ServiceError> {
    serde_json::to_value(value).map_err(|e| ServiceError::from_scraper(operation, &e.into()))
}

/// Handles `scrape {search}`: returns the newly stored structured records.
pub async fn handle_scrape(scraper: &Scraper, request: &Value) -> Result<Value, ServiceError> {
    let search = search_term(request)?;
    let records = scraper
        .scrape(search)
        .await
        .map_err(|e| ServiceError::from_scraper("scrape", &e))?;
    to_json("scrape", &records)
}

/// Handles `extract {search}`: returns new and previously stored article records.
pub async fn handle_extract(scraper: &Scraper, request: &Value) -> Result<Value, ServiceError> {
    let search = search_term(request)?;
    let records = scraper
        .extract(search)
        .await
        .map_err(|e| ServiceError::from_scraper("extract", &e))?;
    to_json("extract", &records)
}

/// Handles `data {page_num, page_size}`.
///
/// The response keeps the established wire names: `total_data`,
/// `total_pages`, `page_num` and `data`.
pub async fn handle_page(scraper: &Scraper, request: &Value) -> Result<Value, ServiceError> {
    let page_num = positive_field(request, "page_num")?;
    let page_size = positive_field(request, "page_size")?;
    let page = scraper
        .page(page_num, page_size)
        .await
        .map_err(|e| ServiceError::from_scraper("data", &e))?;

    Ok(json!({
        "total_data": page.total_count,
        "total_pages": page.total_pages,
        "page_num": page.page_num,
        "data": to_json("data", &page.items)?,
    }))
}

/// Returns the greeting payload.
#[must_use]
pub fn welcome() -> Value {
    json!({ "message": WELCOME_MESSAGE })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PacingConfig, ScraperConfig};
    use crate::errors::{FetchError, StoreError};
    use crate::testing::fixtures::{SAMPLE_PAGE, TWO_RESULTS_PAGE};
    use crate::testing::MockFetcher;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    async fn scraper() -> Scraper {
        let fetcher = MockFetcher::new()
            .with_page("https://www.google.com/search?q=foo", TWO_RESULTS_PAGE)
            .with_page("http://a.test", SAMPLE_PAGE)
            .with_page("http://b.test", SAMPLE_PAGE);
        Scraper::builder(ScraperConfig::new().with_pacing(PacingConfig::disabled()))
            .with_fetcher(Arc::new(fetcher))
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_search_is_bad_request() {
        let scraper = scraper().await;
        for request in [json!({}), json!({"search": ""}), json!({"search": 3}), json!({"search": "  "})] {
            let err = handle_scrape(&scraper, &request).await.unwrap_err();
            assert_eq!(err, ServiceError::bad_request("Search term field is required"));
        }
        let err = handle_extract(&scraper, &json!({})).await.unwrap_err();
        assert_eq!(err.status, 400);
    }

    #[tokio::test]
    async fn test_scrape_then_page() {
        let scraper = scraper().await;
        let scraped = handle_scrape(&scraper, &json!({"search": "foo"})).await.unwrap();
        let items = scraped.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0]["_id"].is_string());
        assert_eq!(items[0]["result_text"], "A");
        assert_eq!(items[0]["headers"]["h1"], "Sample heading");

        let page = handle_page(&scraper, &json!({"page_num": 1, "page_size": 1})).await.unwrap();
        assert_eq!(page["total_data"], 2);
        assert_eq!(page["total_pages"], 2);
        assert_eq!(page["page_num"], 1);
        assert_eq!(page["data"][0]["url"], "http://a.test");
    }

    #[tokio::test]
    async fn test_page_errors() {
        let scraper = scraper().await;
        let err = handle_page(&scraper, &json!({"page_num": 1, "page_size": 10})).await.unwrap_err();
        assert_eq!(err, ServiceError::bad_request("Page number out of range: page 1 of 0"));

        let err = handle_page(&scraper, &json!({"page_size": 10})).await.unwrap_err();
        assert_eq!(err.detail, "page_num field is required");

        let err = handle_page(&scraper, &json!({"page_num": -1, "page_size": 10})).await.unwrap_err();
        assert_eq!(err.status, 400);
    }

    #[tokio::test]
    async fn test_extract_returns_articles() {
        let scraper = scraper().await;
        let extracted = handle_extract(&scraper, &json!({"search": "foo"})).await.unwrap();
        assert_eq!(extracted.as_array().map(Vec::len), Some(2));
        assert_eq!(extracted[0]["title"], "Sample OG");
    }

    #[tokio::test]
    async fn test_store_failure_is_opaque_500() {
        let scraper = scraper().await;
        scraper.close().await.unwrap();
        let err = handle_scrape(&scraper, &json!({"search": "foo"})).await.unwrap_err();
        assert_eq!(err, ServiceError::internal());
    }

    #[test]
    fn test_error_mapping() {
        let store: ScraperError = StoreError::new("web_data", "disk full").into();
        assert_eq!(ServiceError::from_scraper("scrape", &store).detail, INTERNAL_ERROR_DETAIL);

        let fetch: ScraperError = FetchError::new("http://a.test", "reset").into();
        assert_eq!(ServiceError::from_scraper("scrape", &fetch).status, 500);
    }

    #[test]
    fn test_welcome() {
        assert_eq!(welcome()["message"], WELCOME_MESSAGE);
    }
}
