//! Search engine result finder.
//!
//! Scrapes an HTML results page; no API key involved.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use super::config::SearchConfig;
use super::models::SearchResult;
use super::protocols::{Fetcher, ResultFinder};
use crate::errors::{ParseError, ScraperError};
use crate::pacing::RateLimiter;

/// Finds candidate URLs by scraping a search engine's HTML results page.
pub struct HtmlResultFinder {
    fetcher: Arc<dyn Fetcher>,
    limiter: Arc<dyn RateLimiter>,
    config: SearchConfig,
}

impl HtmlResultFinder {
    /// Creates a new result finder.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, limiter: Arc<dyn RateLimiter>, config: SearchConfig) -> Self {
        Self {
            fetcher,
            limiter,
            config,
        }
    }

    /// Builds the request URL for a query.
    pub fn search_url(&self, query: &str) -> Result<String, ScraperError> {
        let url = Url::parse_with_params(
            &self.config.endpoint,
            &[(self.config.query_param.as_str(), query)],
        )
        .map_err(|e| ParseError::new(format!("endpoint '{}'", self.config.endpoint), e.to_string()))?;
        Ok(url.into())
    }

    /// Gets the configuration.
    #[must_use]
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }
}

#[async_trait]
impl ResultFinder for HtmlResultFinder {
    async fn find(&self, query: &str) -> Result<Vec<SearchResult>, ScraperError> {
        let url = self.search_url(query)?;

        self.limiter.wait().await;
        let response = self.fetcher.fetch(&url).await?;

        let results = parse_results(&response.text, &self.config)?;
        if results.is_empty() && !response.is_success() {
            warn!(query = %query, status_code = response.status_code, "Search engine returned an error page");
        }
        debug!(query = %query, results = results.len(), "Parsed search results");
        Ok(results)
    }
}

fn compile(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::selector(selector, format!("{e:?}")))
}

/// Extracts up to `config.max_results` results, and never more than
/// [`MAX_RESULTS`](super::config::MAX_RESULTS), from a results page.
///
/// Containers without an anchor target are skipped; a missing snippet
/// yields `None`.
pub fn parse_results(html: &str, config: &SearchConfig) -> Result<Vec<SearchResult>, ParseError> {
    let container = compile(&config.result_selector)?;
    let link = compile(&config.link_selector)?;
    let snippet = compile(&config.snippet_selector)?;

    let document = Html::parse_document(html);
    let mut results = Vec::new();

    for result in document.select(&container) {
        if results.len() >= config.result_limit() {
            break;
        }

        let Some(href) = result
            .select(&link)
            .find_map(|anchor| anchor.value().attr("href"))
        else {
            continue;
        };

        let snippet_text = result
            .select(&snippet)
            .next()
            .map(|el| el.text().collect::<String>());

        results.push(SearchResult {
            url: href.to_string(),
            snippet: snippet_text,
        });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::NoDelay;
    use crate::testing::fixtures::SEARCH_RESULTS_PAGE;
    use crate::testing::MockFetcher;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_results() {
        let results = parse_results(SEARCH_RESULTS_PAGE, &SearchConfig::default()).unwrap();
        assert_eq!(
            results,
            vec![
                SearchResult::new("http://a.test").with_snippet("Snippet for A"),
                SearchResult::new("http://b.test"),
                SearchResult::new("http://c.test").with_snippet("Snippet for C"),
            ]
        );
    }

    #[test]
    fn test_parse_results_caps_at_max() {
        let mut html = String::from("<html><body>");
        for i in 0..15 {
            html.push_str(&format!(
                r#"<div class="tF2Cxc"><a href="http://r{i}.test">R{i}</a></div>"#
            ));
        }
        html.push_str("</body></html>");

        let results = parse_results(&html, &SearchConfig::default()).unwrap();
        assert_eq!(results.len(), 10);
        assert_eq!(results[9].url, "http://r9.test");

        let small = SearchConfig::default().with_max_results(3);
        assert_eq!(parse_results(&html, &small).unwrap().len(), 3);

        let oversized = SearchConfig::default().with_max_results(50);
        assert_eq!(parse_results(&html, &oversized).unwrap().len(), 10);
    }

    #[test]
    fn test_parse_results_markup_mismatch_is_empty() {
        let results =
            parse_results("<html><body><p>unusual traffic</p></body></html>", &SearchConfig::default())
                .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_invalid_selector_is_parse_error() {
        let config = SearchConfig::default().with_selectors("div[", "a", "span");
        let err = parse_results("<html></html>", &config).unwrap_err();
        assert!(err.context.contains("div["));
    }

    #[test]
    fn test_search_url_encodes_query() {
        let finder = HtmlResultFinder::new(
            Arc::new(MockFetcher::new()),
            Arc::new(NoDelay),
            SearchConfig::default(),
        );
        let url = finder.search_url("rust & web scraping").unwrap();
        assert_eq!(url, "https://www.google.com/search?q=rust+%26+web+scraping");
    }

    #[tokio::test]
    async fn test_find_fetches_results_page() {
        let finder_config = SearchConfig::default().with_endpoint("http://search.test/html");
        let fetcher = Arc::new(
            MockFetcher::new().with_page("http://search.test/html?q=foo", SEARCH_RESULTS_PAGE),
        );
        let finder = HtmlResultFinder::new(fetcher.clone(), Arc::new(NoDelay), finder_config);

        let results = finder.find("foo").await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(fetcher.call_count("http://search.test/html?q=foo"), 1);
    }

    #[tokio::test]
    async fn test_find_network_failure_is_recoverable() {
        let finder = HtmlResultFinder::new(
            Arc::new(MockFetcher::new()),
            Arc::new(NoDelay),
            SearchConfig::default(),
        );
        let err = finder.find("foo").await.unwrap_err();
        assert!(err.is_recoverable());
    }
}
