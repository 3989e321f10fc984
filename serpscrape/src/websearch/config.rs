//! Configuration types for searching, fetching and extraction.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::config::duration_from_secs;
use crate::errors::ValidationError;

const DESKTOP_CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const DESKTOP_CHROME_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Configuration for HTTP fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds. `None` leaves the transport default.
    #[serde(default)]
    pub timeout_seconds: Option<f64>,
    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// User agent string sent with every request.
    #[serde(default = "default_page_user_agent")]
    pub user_agent: String,
    /// Whether a non-2xx response is treated as a fetch failure.
    #[serde(default)]
    pub reject_error_status: bool,
    /// Additional headers to include.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_max_redirects() -> usize {
    10
}

fn default_page_user_agent() -> String {
    DESKTOP_CHROME_MAC.to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: None,
            max_redirects: default_max_redirects(),
            user_agent: default_page_user_agent(),
            reject_error_status: false,
            headers: HashMap::new(),
        }
    }
}

impl FetchConfig {
    /// Creates a new fetch configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Treats non-2xx responses as failures.
    #[must_use]
    pub const fn rejecting_error_status(mut self) -> Self {
        self.reject_error_status = true;
        self
    }

    /// Gets the timeout as a `Duration`.
    ///
    /// A timeout must be positive and at most a day.
    pub fn timeout(&self) -> Result<Option<Duration>, ValidationError> {
        let Some(seconds) = self.timeout_seconds else {
            return Ok(None);
        };
        let timeout = duration_from_secs("timeout_seconds", seconds)?;
        if timeout.is_zero() {
            return Err(ValidationError::new("timeout_seconds", "timeout_seconds must be positive"));
        }
        Ok(Some(timeout))
    }
}

/// Configuration for the search engine results page.
///
/// The selectors follow the markup conventions of the engine and need
/// updating whenever the engine changes its result layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Query-string parameter carrying the search term.
    #[serde(default = "default_query_param")]
    pub query_param: String,
    /// Selector for one result container.
    #[serde(default = "default_result_selector")]
    pub result_selector: String,
    /// Selector, relative to the container, for the result anchor.
    #[serde(default = "default_link_selector")]
    pub link_selector: String,
    /// Selector, relative to the container, for the snippet text.
    #[serde(default = "default_snippet_selector")]
    pub snippet_selector: String,
    /// Maximum number of results kept per query.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Fetch settings for the search request.
    #[serde(default = "default_search_fetch")]
    pub fetch: FetchConfig,
}

fn default_endpoint() -> String {
    "https://www.google.com/search".to_string()
}

fn default_query_param() -> String {
    "q".to_string()
}

fn default_result_selector() -> String {
    "div.tF2Cxc".to_string()
}

fn default_link_selector() -> String {
    "a[href]".to_string()
}

fn default_snippet_selector() -> String {
    "div.VwiC3b".to_string()
}

/// Upper bound on results kept per query.
pub const MAX_RESULTS: usize = 10;

fn default_max_results() -> usize {
    MAX_RESULTS
}

fn default_search_fetch() -> FetchConfig {
    FetchConfig::default().with_user_agent(DESKTOP_CHROME_WINDOWS)
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            query_param: default_query_param(),
            result_selector: default_result_selector(),
            link_selector: default_link_selector(),
            snippet_selector: default_snippet_selector(),
            max_results: default_max_results(),
            fetch: default_search_fetch(),
        }
    }
}

impl SearchConfig {
    /// Creates a new search configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the container, link and snippet selectors.
    #[must_use]
    pub fn with_selectors(
        mut self,
        result: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        self.result_selector = result.into();
        self.link_selector = link.into();
        self.snippet_selector = snippet.into();
        self
    }

    /// Sets the result cap.
    #[must_use]
    pub const fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// The number of results kept per query, never above [`MAX_RESULTS`].
    #[must_use]
    pub fn result_limit(&self) -> usize {
        self.max_results.min(MAX_RESULTS)
    }

    /// Checks the result cap and the search fetch settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=MAX_RESULTS).contains(&self.max_results) {
            return Err(ValidationError::new(
                "max_results",
                format!("max_results must be between 1 and {MAX_RESULTS}, got {}", self.max_results),
            ));
        }
        self.fetch.timeout()?;
        Ok(())
    }
}

/// How repeated elements are keyed in a structured record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// One key per tag (or per caption); later elements overwrite earlier ones.
    #[default]
    Collapse,
    /// An index suffix keeps every element.
    Indexed,
}

/// Configuration for structured field extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Keying of `h1`/`h2`/`h3` headings.
    #[serde(default)]
    pub heading_keys: KeyStrategy,
    /// Keying of tables.
    #[serde(default)]
    pub table_keys: KeyStrategy,
}

impl ExtractionConfig {
    /// Creates a new extraction configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the heading key strategy.
    #[must_use]
    pub const fn with_heading_keys(mut self, strategy: KeyStrategy) -> Self {
        self.heading_keys = strategy;
        self
    }

    /// Sets the table key strategy.
    #[must_use]
    pub const fn with_table_keys(mut self, strategy: KeyStrategy) -> Self {
        self.table_keys = strategy;
        self
    }
}

/// Configuration for article (boilerplate-free) extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleConfig {
    /// Tags never considered part of the article.
    #[serde(default = "default_remove_tags")]
    pub remove_tags: Vec<String>,
    /// Selectors tried in order for the main content container.
    #[serde(default = "default_content_selectors")]
    pub content_selectors: Vec<String>,
    /// Paragraph text needed before a content selector match is accepted.
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,
    /// Paragraphs shorter than this many words do not score.
    #[serde(default = "default_min_paragraph_words")]
    pub min_paragraph_words: usize,
    /// Separators between a page title and the site name.
    #[serde(default = "default_title_separators")]
    pub title_separators: Vec<String>,
    /// A removable tag or boilerplate class holding at least this share of the
    /// body's visible text is a layout wrapper and is kept.
    #[serde(default = "default_wrapper_text_ratio")]
    pub wrapper_text_ratio: f64,
}

fn default_remove_tags() -> Vec<String> {
    [
        "script", "style", "noscript", "nav", "footer", "header", "aside", "form", "iframe", "svg",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

fn default_content_selectors() -> Vec<String> {
    vec![
        "article".to_string(),
        "main".to_string(),
        "[role=\"main\"]".to_string(),
        ".post-content".to_string(),
        ".article-content".to_string(),
        ".entry-content".to_string(),
        ".article-body".to_string(),
        "#content".to_string(),
    ]
}

fn default_min_content_chars() -> usize {
    200
}

fn default_min_paragraph_words() -> usize {
    3
}

fn default_wrapper_text_ratio() -> f64 {
    0.5
}

fn default_title_separators() -> Vec<String> {
    [" | ", " - ", " – ", " — ", " :: ", " » "]
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl Default for ArticleConfig {
    fn default() -> Self {
        Self {
            remove_tags: default_remove_tags(),
            content_selectors: default_content_selectors(),
            min_content_chars: default_min_content_chars(),
            min_paragraph_words: default_min_paragraph_words(),
            title_separators: default_title_separators(),
            wrapper_text_ratio: default_wrapper_text_ratio(),
        }
    }
}

impl ArticleConfig {
    /// Creates a new article configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a main content selector.
    #[must_use]
    pub fn with_content_selector(mut self, selector: impl Into<String>) -> Self {
        self.content_selectors.push(selector.into());
        self
    }

    /// Sets the minimum paragraph text for a content selector match.
    #[must_use]
    pub const fn with_min_content_chars(mut self, chars: usize) -> Self {
        self.min_content_chars = chars;
        self
    }

    /// Sets the text share above which a boilerplate match counts as a wrapper.
    #[must_use]
    pub const fn with_wrapper_text_ratio(mut self, ratio: f64) -> Self {
        self.wrapper_text_ratio = ratio;
        self
    }
}
