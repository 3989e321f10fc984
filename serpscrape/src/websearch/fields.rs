//! Structured field extraction.
//!
//! Turns an arbitrary HTML page into a [`StructuredRecord`]: title, meta
//! tags, paragraphs, links, headings, images, lists and tables.

#![allow(clippy::expect_used)]

use async_trait::async_trait;
use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::debug;

use super::config::{ExtractionConfig, KeyStrategy};
use super::models::{StructuredRecord, TableRow, NO_LINKS_KEY, NO_LINKS_VALUE};
use super::protocols::{Fetcher, PageExtractor};
use crate::errors::ScraperError;

macro_rules! selector {
    ($name:ident, $css:literal) => {
        static $name: LazyLock<Selector> =
            LazyLock::new(|| Selector::parse($css).expect(concat!("selector ", $css)));
    };
}

selector!(TITLE, "title");
selector!(META, "meta");
selector!(PARAGRAPH, "p");
selector!(LINK, "a[href]");
selector!(HEADING, "h1, h2, h3");
selector!(IMAGE, "img[src]");
selector!(UNORDERED, "ul");
selector!(ORDERED, "ol");
selector!(ITEM, "li");
selector!(TABLE, "table");
selector!(ROW, "tr");
selector!(HEADER_CELL, "th");
selector!(CELL, "th, td");
selector!(CAPTION, "caption");

/// Label used for tables without a caption.
pub const UNCAPTIONED_TABLE: &str = "Table";

fn trimmed_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extracts a structured record from an HTML document.
///
/// Pure and deterministic: the same input always yields the same record.
#[must_use]
pub fn extract_fields(html: &str, url: &str, config: &ExtractionConfig) -> StructuredRecord {
    let document = Html::parse_document(html);

    let meta_tags = extract_meta_tags(&document);
    let seo_description = meta_tags.get("description").cloned().flatten();

    StructuredRecord {
        url: url.to_string(),
        title: document.select(&TITLE).next().map(|t| trimmed_text(&t)),
        seo_description,
        meta_tags,
        paragraphs: indexed(&document, &PARAGRAPH, "paragraph", |p| Some(trimmed_text(p))),
        links: extract_links(&document),
        headings: extract_headings(&document, config.heading_keys),
        images: indexed(&document, &IMAGE, "image", |img| {
            img.value().attr("src").map(String::from)
        }),
        lists: extract_lists(&document),
        tables: extract_tables(&document, config.table_keys),
        result_text: None,
    }
}

fn indexed<F>(document: &Html, selector: &Selector, prefix: &str, value: F) -> IndexMap<String, String>
where
    F: Fn(&ElementRef<'_>) -> Option<String>,
{
    document
        .select(selector)
        .filter_map(|el| value(&el))
        .enumerate()
        .map(|(i, v)| (format!("{prefix}_{i}"), v))
        .collect()
}

fn extract_meta_tags(document: &Html) -> IndexMap<String, Option<String>> {
    let mut tags = IndexMap::new();
    for meta in document.select(&META) {
        let element = meta.value();
        let key = element
            .attr("name")
            .filter(|n| !n.is_empty())
            .or_else(|| element.attr("property").filter(|p| !p.is_empty()));
        if let Some(key) = key {
            tags.insert(key.to_lowercase(), element.attr("content").map(String::from));
        }
    }
    tags
}

fn extract_links(document: &Html) -> IndexMap<String, String> {
    let links = indexed(document, &LINK, "link", |a| a.value().attr("href").map(String::from));
    if links.is_empty() {
        return IndexMap::from([(NO_LINKS_KEY.to_string(), NO_LINKS_VALUE.to_string())]);
    }
    links
}

fn extract_headings(document: &Html, strategy: KeyStrategy) -> IndexMap<String, String> {
    let mut headings = IndexMap::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for heading in document.select(&HEADING) {
        let tag = heading.value().name().to_string();
        let key = match strategy {
            KeyStrategy::Collapse => tag,
            KeyStrategy::Indexed => {
                let count = seen.entry(tag.clone()).or_insert(0);
                let key = format!("{tag}_{count}");
                *count += 1;
                key
            }
        };
        headings.insert(key, trimmed_text(&heading));
    }

    headings
}

fn extract_lists(document: &Html) -> IndexMap<String, Vec<String>> {
    let mut lists = IndexMap::new();
    for (prefix, selector) in [("ul", &*UNORDERED), ("ol", &*ORDERED)] {
        for (i, list) in document.select(selector).enumerate() {
            let items = list.select(&ITEM).map(|li| trimmed_text(&li)).collect();
            lists.insert(format!("{prefix}_{i}"), items);
        }
    }
    lists
}

fn extract_tables(document: &Html, strategy: KeyStrategy) -> IndexMap<String, Vec<TableRow>> {
    let mut tables = IndexMap::new();

    for (i, table) in document.select(&TABLE).enumerate() {
        let label = table
            .select(&CAPTION)
            .next()
            .map_or_else(|| UNCAPTIONED_TABLE.to_string(), |c| trimmed_text(&c));
        let key = match strategy {
            KeyStrategy::Collapse => label,
            KeyStrategy::Indexed => format!("{label}_{i}"),
        };
        tables.insert(key, table_rows(&table));
    }

    tables
}

fn table_rows(table: &ElementRef<'_>) -> Vec<TableRow> {
    let mut rows = table.select(&ROW);

    let headers: Vec<String> = rows
        .next()
        .map(|header_row| header_row.select(&HEADER_CELL).map(|th| trimmed_text(&th)).collect())
        .unwrap_or_default();

    rows.map(|row| {
        let cells: Vec<String> = row.select(&CELL).map(|cell| trimmed_text(&cell)).collect();
        if !headers.is_empty() && cells.len() == headers.len() {
            headers.iter().cloned().zip(cells).collect()
        } else {
            cells
                .into_iter()
                .enumerate()
                .map(|(idx, text)| (format!("default_{idx}"), text))
                .collect()
        }
    })
    .collect()
}

/// Fetches pages and extracts structured records from them.
pub struct FieldExtractor {
    fetcher: Arc<dyn Fetcher>,
    config: ExtractionConfig,
}

impl FieldExtractor {
    /// Creates a new field extractor.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, config: ExtractionConfig) -> Self {
        Self { fetcher, config }
    }

    /// Gets the configuration.
    #[must_use]
    pub const fn config(&self) -> &ExtractionConfig {
        &self.config
    }
}

#[async_trait]
impl PageExtractor for FieldExtractor {
    type Record = StructuredRecord;

    async fn extract(&self, url: &str) -> Result<StructuredRecord, ScraperError> {
        let response = self.fetcher.fetch(url).await?;
        let record = extract_fields(&response.text, url, &self.config);
        debug!(
            url = %url,
            paragraphs = record.paragraphs.len(),
            tables = record.tables.len(),
            "Extracted structured fields"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{
        PAGE_WITHOUT_LINKS, REPEATED_HEADINGS, SAMPLE_PAGE, TWO_UNCAPTIONED_TABLES,
    };
    use crate::testing::MockFetcher;
    use pretty_assertions::assert_eq;

    fn extract(html: &str) -> StructuredRecord {
        extract_fields(html, "http://a.test", &ExtractionConfig::default())
    }

    #[test]
    fn test_title_and_meta() {
        let record = extract(SAMPLE_PAGE);
        assert_eq!(record.title.as_deref(), Some("Sample Page"));
        assert_eq!(record.seo_description.as_deref(), Some("A page used in tests"));
        assert_eq!(
            record.meta_tags.get("og:title"),
            Some(&Some("Sample OG".to_string()))
        );
        assert_eq!(record.meta_tags.get("viewport"), Some(&None));
        assert!(!record.meta_tags.contains_key("charset"));
    }

    #[test]
    fn test_meta_later_duplicate_wins() {
        let html = r#"<html><head>
            <meta name="Description" content="first">
            <meta name="description" content="second">
        </head></html>"#;
        let record = extract(html);
        assert_eq!(record.meta_tags.len(), 1);
        assert_eq!(record.seo_description.as_deref(), Some("second"));
    }

    #[test]
    fn test_paragraphs_links_images() {
        let record = extract(SAMPLE_PAGE);
        assert_eq!(record.paragraphs.get("paragraph_0").map(String::as_str), Some("First paragraph."));
        assert_eq!(record.paragraphs.get("paragraph_1").map(String::as_str), Some("Second paragraph with a link."));
        assert_eq!(
            record.links.values().cloned().collect::<Vec<_>>(),
            vec!["/about".to_string(), "https://other.test/page".to_string()]
        );
        assert_eq!(record.images.get("image_0").map(String::as_str), Some("/logo.png"));
        assert_eq!(record.images.len(), 1);
    }

    #[test]
    fn test_page_without_links_has_sentinel() {
        let record = extract(PAGE_WITHOUT_LINKS);
        assert_eq!(
            record.links,
            IndexMap::from([(NO_LINKS_KEY.to_string(), NO_LINKS_VALUE.to_string())])
        );
        assert!(record.has_no_links());
    }

    #[test]
    fn test_repeated_headings_collapse() {
        let record = extract(REPEATED_HEADINGS);
        assert_eq!(record.headings.get("h2").map(String::as_str), Some("Second section"));
        assert_eq!(record.headings.get("h1").map(String::as_str), Some("Main title"));
        assert_eq!(record.headings.len(), 2);
    }

    #[test]
    fn test_repeated_headings_indexed() {
        let config = ExtractionConfig::new().with_heading_keys(KeyStrategy::Indexed);
        let record = extract_fields(REPEATED_HEADINGS, "http://a.test", &config);
        assert_eq!(record.headings.get("h2_0").map(String::as_str), Some("First section"));
        assert_eq!(record.headings.get("h2_1").map(String::as_str), Some("Second section"));
        assert_eq!(record.headings.get("h1_0").map(String::as_str), Some("Main title"));
    }

    #[test]
    fn test_lists() {
        let record = extract(SAMPLE_PAGE);
        assert_eq!(
            record.lists.get("ul_0"),
            Some(&vec!["Apple".to_string(), "Banana".to_string()])
        );
        assert_eq!(
            record.lists.get("ol_0"),
            Some(&vec!["Step one".to_string(), "Step two".to_string()])
        );
        let keys: Vec<_> = record.lists.keys().cloned().collect();
        assert_eq!(keys, vec!["ul_0".to_string(), "ol_0".to_string()]);
    }

    #[test]
    fn test_captioned_table_rows() {
        let record = extract(SAMPLE_PAGE);
        let rows = record.tables.get("Prices").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Item").map(String::as_str), Some("Tea"));
        assert_eq!(rows[0].get("Price").map(String::as_str), Some("2"));
        assert_eq!(rows[1].get("default_0").map(String::as_str), Some("Total"));
        assert_eq!(rows[1].len(), 1);
    }

    #[test]
    fn test_uncaptioned_tables_collide() {
        let record = extract(TWO_UNCAPTIONED_TABLES);
        assert_eq!(record.tables.len(), 1);
        let rows = record.tables.get(UNCAPTIONED_TABLE).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Second").map(String::as_str), Some("from table two"));
    }

    #[test]
    fn test_uncaptioned_tables_indexed() {
        let config = ExtractionConfig::new().with_table_keys(KeyStrategy::Indexed);
        let record = extract_fields(TWO_UNCAPTIONED_TABLES, "http://a.test", &config);
        assert_eq!(record.tables.len(), 2);
        assert_eq!(
            record.tables["Table_0"][0].get("First").map(String::as_str),
            Some("from table one")
        );
        assert_eq!(
            record.tables["Table_1"][0].get("Second").map(String::as_str),
            Some("from table two")
        );
    }

    #[test]
    fn test_table_without_header_cells_uses_defaults() {
        let html = "<table><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></table>";
        let record = extract(html);
        let rows = &record.tables[UNCAPTIONED_TABLE];
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("default_0").map(String::as_str), Some("c"));
        assert_eq!(rows[0].get("default_1").map(String::as_str), Some("d"));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let first = extract(SAMPLE_PAGE);
        let second = extract(SAMPLE_PAGE);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_empty_document() {
        let record = extract("");
        assert_eq!(record.title, None);
        assert!(record.paragraphs.is_empty());
        assert!(record.has_no_links());
    }

    #[tokio::test]
    async fn test_field_extractor_fetches() {
        let fetcher = Arc::new(MockFetcher::new().with_page("http://a.test", SAMPLE_PAGE));
        let extractor = FieldExtractor::new(fetcher.clone(), ExtractionConfig::default());

        let record = extractor.extract("http://a.test").await.unwrap();
        assert_eq!(record.url, "http://a.test");
        assert_eq!(fetcher.call_count("http://a.test"), 1);

        let err = extractor.extract("http://missing.test").await.unwrap_err();
        assert!(err.is_recoverable());
    }
}
