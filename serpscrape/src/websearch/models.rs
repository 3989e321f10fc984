//! Data models for search results and extracted records.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Key of the sentinel entry stored when a page has no links.
pub const NO_LINKS_KEY: &str = "no_links_found";

/// Value of the sentinel entry stored when a page has no links.
pub const NO_LINKS_VALUE: &str = "No links found on this page";

/// One row of an extracted table, keyed by column header.
pub type TableRow = IndexMap<String, String>;

/// A candidate URL returned by the search engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResult {
    /// Target URL of the result.
    pub url: String,
    /// Snippet shown next to the result, if any.
    pub snippet: Option<String>,
}

impl SearchResult {
    /// Creates a new search result.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            snippet: None,
        }
    }

    /// Sets the snippet.
    #[must_use]
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

/// Behaviour shared by every record type kept in a collection.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The identity key of the record.
    fn url(&self) -> &str;

    /// Attaches the search snippet that led to this record.
    ///
    /// Records that do not carry a snippet ignore it.
    fn set_result_text(&mut self, _snippet: Option<String>) {}
}

/// The full multi-field extraction from one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StructuredRecord {
    /// Page URL.
    pub url: String,
    /// Trimmed `<title>` text.
    pub title: Option<String>,
    /// The `description` meta tag.
    pub seo_description: Option<String>,
    /// Meta tags keyed by lower-cased `name` or `property`.
    #[serde(default)]
    pub meta_tags: IndexMap<String, Option<String>>,
    /// `paragraph_<i>` → paragraph text.
    #[serde(default)]
    pub paragraphs: IndexMap<String, String>,
    /// `link_<i>` → href, or the no-links sentinel.
    #[serde(default)]
    pub links: IndexMap<String, String>,
    /// Heading text keyed per the configured key strategy.
    #[serde(default, rename = "headers", alias = "headings")]
    pub headings: IndexMap<String, String>,
    /// `image_<i>` → src.
    #[serde(default)]
    pub images: IndexMap<String, String>,
    /// `ul_<i>` / `ol_<i>` → item texts.
    #[serde(default)]
    pub lists: IndexMap<String, Vec<String>>,
    /// Caption (or `Table`) → rows.
    #[serde(default)]
    pub tables: IndexMap<String, Vec<TableRow>>,
    /// Snippet of the search result that led here.
    #[serde(default)]
    pub result_text: Option<String>,
}

impl StructuredRecord {
    /// Creates an empty record for a URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Whether the page had no links and carries the sentinel instead.
    #[must_use]
    pub fn has_no_links(&self) -> bool {
        self.links.len() == 1 && self.links.contains_key(NO_LINKS_KEY)
    }
}

impl Record for StructuredRecord {
    fn url(&self) -> &str {
        &self.url
    }

    fn set_result_text(&mut self, snippet: Option<String>) {
        self.result_text = snippet;
    }
}

/// The simplified title and cleaned-body extraction from one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleRecord {
    /// Page URL.
    pub url: String,
    /// Best-guess article title.
    #[serde(default)]
    pub title: String,
    /// Main body text with boilerplate removed.
    #[serde(default)]
    pub body_text: String,
}

impl ArticleRecord {
    /// Creates a new article record.
    #[must_use]
    pub fn new(url: impl Into<String>, title: impl Into<String>, body_text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            body_text: body_text.into(),
        }
    }

    /// Number of whitespace separated words in the body.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.body_text.split_whitespace().count()
    }
}

impl Record for ArticleRecord {
    fn url(&self) -> &str {
        &self.url
    }
}

/// A record as it leaves the store, with its identifier as a string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(bound(deserialize = "R: DeserializeOwned"))]
pub struct Stored<R> {
    /// Store-assigned identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// The stored record.
    #[serde(flatten)]
    pub record: R,
}

impl<R> Stored<R> {
    /// Wraps a record with its identifier.
    #[must_use]
    pub fn new(id: impl Into<String>, record: R) -> Self {
        Self {
            id: id.into(),
            record,
        }
    }
}

/// A window over a stored collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page<T> {
    /// Documents in the collection.
    pub total_count: u64,
    /// Pages available at the requested size.
    pub total_pages: u64,
    /// 1-indexed page number.
    pub page_num: u64,
    /// Items on this page, in insertion order.
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page_num < self.total_pages
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page_num > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_search_result_builder() {
        let result = SearchResult::new("http://a.test").with_snippet("A");
        assert_eq!(result.url, "http://a.test");
        assert_eq!(result.snippet.as_deref(), Some("A"));
    }

    #[test]
    fn test_structured_record_serializes_headings_as_headers() {
        let mut record = StructuredRecord::new("http://a.test");
        record.headings.insert("h1".to_string(), "Welcome".to_string());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["headers"]["h1"], "Welcome");
        assert!(value.get("headings").is_none());
    }

    #[test]
    fn test_stored_flattens_record() {
        let stored = Stored::new("abc", ArticleRecord::new("http://a.test", "Title", "Body"));
        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["_id"], "abc");
        assert_eq!(value["url"], "http://a.test");

        let back: Stored<ArticleRecord> = serde_json::from_value(value).unwrap();
        assert_eq!(back, stored);
    }

    #[test]
    fn test_record_snippet_attachment() {
        let mut structured = StructuredRecord::new("http://a.test");
        structured.set_result_text(Some("A".to_string()));
        assert_eq!(structured.result_text.as_deref(), Some("A"));

        let mut article = ArticleRecord::new("http://a.test", "", "one two three");
        article.set_result_text(Some("ignored".to_string()));
        assert_eq!(article.word_count(), 3);
    }

    #[test]
    fn test_no_links_sentinel() {
        let mut record = StructuredRecord::new("http://a.test");
        record.links.insert(NO_LINKS_KEY.to_string(), NO_LINKS_VALUE.to_string());
        assert!(record.has_no_links());
    }

    #[test]
    fn test_page_navigation() {
        let page: Page<u8> = Page {
            total_count: 25,
            total_pages: 3,
            page_num: 2,
            items: vec![],
        };
        assert!(page.has_next());
        assert!(page.has_prev());
    }
}
