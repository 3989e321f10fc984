//! # Serpscrape
//!
//! A search-driven web scraper.
//!
//! A search term is turned into candidate URLs by scraping a search engine
//! results page. Each candidate is fetched and turned into either a full
//! structured record (meta tags, paragraphs, links, headings, images, lists
//! and tables) or an article record (title and cleaned body text). Records
//! are deduplicated by URL against a document store and can be read back
//! page by page.
//!
//! - **Result finder**: search term → up to ten `(url, snippet)` results
//! - **Field extractor**: HTML → [`StructuredRecord`](websearch::StructuredRecord)
//! - **Article extractor**: HTML → [`ArticleRecord`](websearch::ArticleRecord)
//! - **Dedup store**: per-collection URL lookups and inserts
//! - **Paginator**: fixed-size pages over stored records
//! - **Pipeline**: search, dedup, pace, extract and store for one query
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use serpscrape::prelude::*;
//!
//! let scraper = Scraper::open(ScraperConfig::default()).await?;
//! let records = scraper.scrape("rust web scraping").await?;
//! let page = scraper.page(1, 10).await?;
//! scraper.close().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, missing_docs, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cast_precision_loss
)]

pub mod config;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pacing;
pub mod pipeline;
pub mod service;
pub mod store;
pub mod testing;
pub mod websearch;

pub use pipeline::Scraper;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{PacingConfig, ScraperConfig, StoreBackend, StoreConfig};
    pub use crate::errors::{FailureKind, ScraperError};
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::pacing::{MinIntervalLimiter, NoDelay, RateLimiter};
    pub use crate::pipeline::{
        DedupHitPolicy, InsertMode, Pipeline, PipelineOptions, Scraper, ScraperBuilder,
    };
    pub use crate::store::{DocumentStore, MemoryStore, Paginator, RecordCollection, SqliteStore};
    pub use crate::websearch::{
        ArticleRecord, Page, Record, SearchResult, Stored, StructuredRecord,
    };
}
