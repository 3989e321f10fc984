//! Top-level scraper configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{ScraperError, ValidationError};
use crate::websearch::{ArticleConfig, ExtractionConfig, FetchConfig, SearchConfig};

/// Complete configuration for a [`crate::Scraper`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Search engine settings.
    #[serde(default)]
    pub search: SearchConfig,
    /// Settings for fetching target pages.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Structured field extraction settings.
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Article extraction settings.
    #[serde(default)]
    pub article: ArticleConfig,
    /// Request pacing.
    #[serde(default)]
    pub pacing: PacingConfig,
    /// Document store settings.
    #[serde(default)]
    pub store: StoreConfig,
}

impl ScraperConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ScraperError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot: result cap, timeouts and intervals.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.search.validate()?;
        self.fetch.timeout()?;
        self.pacing.validate()
    }

    /// Loads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScraperError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Sets the pacing configuration.
    #[must_use]
    pub const fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    /// Sets the store configuration.
    #[must_use]
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Sets the search configuration.
    #[must_use]
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }
}

/// Longest timeout or interval accepted from configuration, in seconds.
pub const MAX_CONFIG_SECONDS: f64 = 86_400.0;

/// Converts a configured number of seconds into a `Duration`.
///
/// Negative, non-finite and longer-than-a-day values are rejected.
pub(crate) fn duration_from_secs(field: &str, seconds: f64) -> Result<Duration, ValidationError> {
    if !(0.0..=MAX_CONFIG_SECONDS).contains(&seconds) {
        return Err(ValidationError::new(
            field,
            format!("{field} must be between 0 and {MAX_CONFIG_SECONDS} seconds, got {seconds}"),
        ));
    }
    Duration::try_from_secs_f64(seconds).map_err(|e| ValidationError::new(field, format!("{field}: {e}")))
}

/// Minimum intervals between outbound requests, in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Between search engine requests.
    #[serde(default = "default_search_interval")]
    pub search_interval_seconds: f64,
    /// Between page fetches in the structured pipeline.
    #[serde(default = "default_page_interval")]
    pub page_interval_seconds: f64,
    /// Between page fetches in the article pipeline.
    #[serde(default)]
    pub article_interval_seconds: f64,
}

fn default_search_interval() -> f64 {
    2.0
}

fn default_page_interval() -> f64 {
    1.0
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            search_interval_seconds: default_search_interval(),
            page_interval_seconds: default_page_interval(),
            article_interval_seconds: 0.0,
        }
    }
}

impl PacingConfig {
    /// Interval between search engine requests.
    pub fn search_interval(&self) -> Result<Duration, ValidationError> {
        duration_from_secs("search_interval_seconds", self.search_interval_seconds)
    }

    /// Interval between page fetches in the structured pipeline.
    pub fn page_interval(&self) -> Result<Duration, ValidationError> {
        duration_from_secs("page_interval_seconds", self.page_interval_seconds)
    }

    /// Interval between page fetches in the article pipeline.
    pub fn article_interval(&self) -> Result<Duration, ValidationError> {
        duration_from_secs("article_interval_seconds", self.article_interval_seconds)
    }

    /// Checks that every interval converts to a `Duration`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.search_interval()?;
        self.page_interval()?;
        self.article_interval()?;
        Ok(())
    }

    /// Pacing with every delay disabled.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            search_interval_seconds: 0.0,
            page_interval_seconds: 0.0,
            article_interval_seconds: 0.0,
        }
    }
}

/// Which document store backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process memory; contents are lost on exit.
    #[default]
    Memory,
    /// A SQLite database at `database_path`.
    Sqlite,
}

/// Document store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: StoreBackend,
    /// Database file for the SQLite backend; created if missing.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Collection holding structured records.
    #[serde(default = "default_structured_collection")]
    pub structured_collection: String,
    /// Collection holding article records.
    #[serde(default = "default_article_collection")]
    pub article_collection: String,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("scraped_data.db")
}

fn default_structured_collection() -> String {
    "web_data".to_string()
}

fn default_article_collection() -> String {
    "extracted_data".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            database_path: default_database_path(),
            structured_collection: default_structured_collection(),
            article_collection: default_article_collection(),
        }
    }
}

impl StoreConfig {
    /// A SQLite store in the file at `database_path`.
    #[must_use]
    pub fn sqlite(database_path: impl Into<PathBuf>) -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            database_path: database_path.into(),
            ..Self::default()
        }
    }
}
