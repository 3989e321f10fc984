//! The scraper facade owning the store and both pipelines.

use std::sync::Arc;
use tracing::info;

use super::orchestrator::Pipeline;
use super::policy::PipelineOptions;
use crate::config::ScraperConfig;
use crate::errors::{ScraperError, ValidationError};
use crate::events::{EventSink, NoOpEventSink};
use crate::pacing::{MinIntervalLimiter, RateLimiter};
use crate::store::{open_store, DocumentStore, Paginator, RecordCollection};
use crate::websearch::{
    ArticleExtractor, ArticleRecord, FieldExtractor, Fetcher, HtmlResultFinder, HttpFetcher, Page,
    ResultFinder, Stored, StructuredRecord,
};

/// Rejects a missing or blank search term.
pub fn validate_search(search: &str) -> Result<&str, ValidationError> {
    if search.trim().is_empty() {
        return Err(ValidationError::missing("search"));
    }
    Ok(search)
}

/// Runs searches through the structured and article pipelines and serves
/// stored structured records page by page.
///
/// The store is opened when the scraper is built and must be released with
/// [`Scraper::close`].
#[derive(Debug)]
pub struct Scraper {
    config: ScraperConfig,
    store: Arc<dyn DocumentStore>,
    structured: Pipeline<FieldExtractor>,
    articles: Pipeline<ArticleExtractor>,
    paginator: Paginator<StructuredRecord>,
}

impl Scraper {
    /// Opens a scraper with real HTTP and the configured store.
    pub async fn open(config: ScraperConfig) -> Result<Self, ScraperError> {
        Self::builder(config).build().await
    }

    /// Starts a builder for injecting custom components.
    #[must_use]
    pub fn builder(config: ScraperConfig) -> ScraperBuilder {
        ScraperBuilder::new(config)
    }

    /// Searches, extracts structured records from new URLs and stores them.
    ///
    /// Already stored URLs are not refetched and are left out of the result.
    pub async fn scrape(&self, search: &str) -> Result<Vec<Stored<StructuredRecord>>, ScraperError> {
        let search = validate_search(search)?;
        self.structured.run(search).await
    }

    /// Searches and extracts article records.
    ///
    /// Already stored URLs are not refetched; their stored record is returned.
    pub async fn extract(&self, search: &str) -> Result<Vec<Stored<ArticleRecord>>, ScraperError> {
        let search = validate_search(search)?;
        self.articles.run(search).await
    }

    /// Returns one page of stored structured records.
    pub async fn page(
        &self,
        page_num: u64,
        page_size: u64,
    ) -> Result<Page<Stored<StructuredRecord>>, ScraperError> {
        self.paginator.page(page_num, page_size).await
    }

    /// Closes the store. Later operations fail.
    pub async fn close(&self) -> Result<(), ScraperError> {
        self.store.close().await?;
        info!("Scraper closed");
        Ok(())
    }

    /// Gets the configuration.
    #[must_use]
    pub const fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Gets the store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Gets the structured pipeline.
    #[must_use]
    pub const fn structured_pipeline(&self) -> &Pipeline<FieldExtractor> {
        &self.structured
    }

    /// Gets the article pipeline.
    #[must_use]
    pub const fn article_pipeline(&self) -> &Pipeline<ArticleExtractor> {
        &self.articles
    }
}

/// Builder for [`Scraper`].
///
/// Components left unset are created from the configuration. A custom
/// fetcher serves both page fetches and the default result finder.
pub struct ScraperBuilder {
    config: ScraperConfig,
    store: Option<Arc<dyn DocumentStore>>,
    finder: Option<Arc<dyn ResultFinder>>,
    fetcher: Option<Arc<dyn Fetcher>>,
    search_limiter: Option<Arc<dyn RateLimiter>>,
    page_limiter: Option<Arc<dyn RateLimiter>>,
    article_limiter: Option<Arc<dyn RateLimiter>>,
    events: Option<Arc<dyn EventSink>>,
}

impl ScraperBuilder {
    /// Creates a builder.
    #[must_use]
    pub fn new(config: ScraperConfig) -> Self {
        Self {
            config,
            store: None,
            finder: None,
            fetcher: None,
            search_limiter: None,
            page_limiter: None,
            article_limiter: None,
            events: None,
        }
    }

    /// Uses an already opened store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Uses a custom result finder.
    #[must_use]
    pub fn with_finder(mut self, finder: Arc<dyn ResultFinder>) -> Self {
        self.finder = Some(finder);
        self
    }

    /// Uses a custom fetcher.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Paces search requests of the default result finder.
    #[must_use]
    pub fn with_search_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.search_limiter = Some(limiter);
        self
    }

    /// Paces page fetches of the structured pipeline.
    #[must_use]
    pub fn with_page_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.page_limiter = Some(limiter);
        self
    }

    /// Paces page fetches of the article pipeline.
    #[must_use]
    pub fn with_article_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.article_limiter = Some(limiter);
        self
    }

    /// Sends pipeline events to `events`.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// Opens the store if needed and wires the pipelines.
    pub async fn build(self) -> Result<Scraper, ScraperError> {
        let config = self.config;
        config.validate()?;
        let search_interval = config.pacing.search_interval()?;
        let page_interval = config.pacing.page_interval()?;
        let article_interval = config.pacing.article_interval()?;

        let store = match self.store {
            Some(store) => store,
            None => open_store(&config.store).await?,
        };

        let fetcher: Arc<dyn Fetcher> = match &self.fetcher {
            Some(fetcher) => Arc::clone(fetcher),
            None => Arc::new(HttpFetcher::new(config.fetch.clone())?),
        };

        let finder: Arc<dyn ResultFinder> = match self.finder {
            Some(finder) => finder,
            None => {
                let search_fetcher: Arc<dyn Fetcher> = match self.fetcher {
                    Some(fetcher) => fetcher,
                    None => Arc::new(HttpFetcher::new(config.search.fetch.clone())?),
                };
                let limiter = self.search_limiter.unwrap_or_else(|| {
                    Arc::new(MinIntervalLimiter::new(search_interval))
                });
                Arc::new(HtmlResultFinder::new(search_fetcher, limiter, config.search.clone()))
            }
        };

        let events: Arc<dyn EventSink> = self.events.unwrap_or_else(|| Arc::new(NoOpEventSink));

        let page_limiter = self.page_limiter.unwrap_or_else(|| {
            Arc::new(MinIntervalLimiter::new(page_interval))
        });
        let article_limiter = self.article_limiter.unwrap_or_else(|| {
            Arc::new(MinIntervalLimiter::new(article_interval))
        });

        let web_data: RecordCollection<StructuredRecord> =
            RecordCollection::new(Arc::clone(&store), config.store.structured_collection.clone());
        let extracted_data: RecordCollection<ArticleRecord> =
            RecordCollection::new(Arc::clone(&store), config.store.article_collection.clone());

        let structured = Pipeline::new(
            PipelineOptions::structured(),
            Arc::clone(&finder),
            FieldExtractor::new(Arc::clone(&fetcher), config.extraction.clone()),
            web_data.clone(),
        )
        .with_limiter(page_limiter)
        .with_event_sink(Arc::clone(&events));

        let articles = Pipeline::new(
            PipelineOptions::article(),
            finder,
            ArticleExtractor::new(fetcher, config.article.clone())?,
            extracted_data,
        )
        .with_limiter(article_limiter)
        .with_event_sink(events);

        info!(
            backend = ?config.store.backend,
            structured_collection = %config.store.structured_collection,
            article_collection = %config.store.article_collection,
            "Scraper ready"
        );

        Ok(Scraper {
            config,
            store,
            structured,
            articles,
            paginator: Paginator::new(web_data),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PacingConfig;
    use crate::errors::FailureKind;
    use crate::testing::{MockFetcher, StaticResultFinder};

    #[test]
    fn test_validate_search() {
        assert_eq!(validate_search("rust").unwrap(), "rust");
        let err = validate_search("   ").unwrap_err();
        assert_eq!(err.message, "Search term field is required");
        assert!(validate_search("").is_err());
    }

    #[tokio::test]
    async fn test_blank_search_does_no_work() {
        let finder = Arc::new(StaticResultFinder::from_urls(&["http://a.test"]));
        let fetcher = Arc::new(MockFetcher::new());
        let scraper = Scraper::builder(ScraperConfig::new().with_pacing(PacingConfig::disabled()))
            .with_finder(finder.clone())
            .with_fetcher(fetcher.clone())
            .build()
            .await
            .unwrap();

        let err = scraper.scrape(" ").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
        assert!(scraper.extract("").await.is_err());
        assert!(finder.queries().is_empty());
        assert_eq!(fetcher.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_config_fails_to_build() {
        let mut config = ScraperConfig::new().with_pacing(PacingConfig::disabled());
        config.fetch.timeout_seconds = Some(-1.0);
        let err = Scraper::builder(config).build().await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);

        let mut config = ScraperConfig::new();
        config.pacing.page_interval_seconds = 1e20;
        let err = Scraper::builder(config)
            .with_fetcher(Arc::new(MockFetcher::new()))
            .build()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
    }

    #[tokio::test]
    async fn test_close_rejects_later_operations() {
        let scraper = Scraper::builder(ScraperConfig::new().with_pacing(PacingConfig::disabled()))
            .with_fetcher(Arc::new(MockFetcher::new()))
            .build()
            .await
            .unwrap();
        scraper.close().await.unwrap();

        let err = scraper.page(1, 10).await.unwrap_err();
        assert!(matches!(err, ScraperError::Store(_)));
    }
}
