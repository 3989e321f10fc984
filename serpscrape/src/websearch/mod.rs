//! Search, fetching and extraction.
//!
//! This module provides:
//! - Configuration for fetching, searching and extraction
//! - Record models persisted by the store
//! - Protocol traits for pluggable fetchers, finders and extractors
//! - The result finder, field extractor and article extractor

mod article;
mod config;
mod fetcher;
mod fields;
mod finder;
mod models;
mod protocols;

pub use article::{ArticleExtractor, ArticleParser};
pub use config::{ArticleConfig, ExtractionConfig, FetchConfig, KeyStrategy, SearchConfig};
pub use fetcher::HttpFetcher;
pub use fields::{extract_fields, FieldExtractor, UNCAPTIONED_TABLE};
pub use finder::{parse_results, HtmlResultFinder};
pub use models::{
    ArticleRecord, Page, Record, SearchResult, Stored, StructuredRecord, TableRow, NO_LINKS_KEY,
    NO_LINKS_VALUE,
};
pub use protocols::{FetchResult, Fetcher, PageExtractor, ResultFinder};

#[cfg(test)]
pub use protocols::MockResultFinder;
