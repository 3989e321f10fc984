//! Article extraction with boilerplate removal.
//!
//! Strategy, in order:
//! 1. The first configured content selector whose paragraphs carry enough text.
//! 2. The element whose paragraphs score best (word count discounted by link
//!    density, credited to the parent and half to the grandparent).
//! 3. `<body>`.
//!
//! Navigation, footers, sidebars, ads and similar regions are skipped by tag
//! name and by class/id patterns, unless the match wraps most of the page.

#![allow(clippy::expect_used)]

use async_trait::async_trait;
use indexmap::IndexMap;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::{Arc, LazyLock};
use tracing::debug;

use super::config::ArticleConfig;
use super::models::ArticleRecord;
use super::protocols::{Fetcher, PageExtractor};
use crate::errors::{ParseError, ScraperError};

/// Class/id tokens marking navigation, ads and other page furniture.
static BOILERPLATE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(^|[\s_-])(nav|navbar|navigation|menu|breadcrumbs?|sidebar|footer|masthead|banner|ads?|advert|advertisement|sponsored|promo|share|sharing|social|related|recommended|comments?|cookie|consent|newsletter|subscribe|popup|modal)($|[\s_-])",
    )
    .expect("BOILERPLATE_CLASS regex")
});

static OG_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:title"]"#).expect("og:title selector"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").expect("title selector"));
static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("h1 selector"));
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").expect("body selector"));
static SCORED: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p, pre, td").expect("scored block selector"));
static BLOCKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p, pre, blockquote").expect("block selector"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("anchor selector"));

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: &ElementRef<'_>) -> String {
    normalize(&element.text().collect::<Vec<_>>().join(" "))
}

/// Parses article records out of HTML documents.
#[derive(Debug)]
pub struct ArticleParser {
    config: ArticleConfig,
    content_selectors: Vec<Selector>,
}

impl ArticleParser {
    /// Compiles the configured content selectors.
    pub fn new(config: ArticleConfig) -> Result<Self, ParseError> {
        let content_selectors = config
            .content_selectors
            .iter()
            .map(|css| Selector::parse(css).map_err(|e| ParseError::selector(css, format!("{e:?}"))))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            config,
            content_selectors,
        })
    }

    /// Gets the configuration.
    #[must_use]
    pub const fn config(&self) -> &ArticleConfig {
        &self.config
    }

    /// Extracts the title and cleaned body text from a document.
    #[must_use]
    pub fn parse(&self, html: &str, url: &str) -> ArticleRecord {
        let document = Html::parse_document(html);
        let title = self.title(&document);
        let layout = self.layout(&document);
        let body_text = self
            .content_root(&document, &layout)
            .map(|root| body_text(root, &layout))
            .unwrap_or_default();

        ArticleRecord {
            url: url.to_string(),
            title,
            body_text,
        }
    }

    fn title(&self, document: &Html) -> String {
        let raw = document
            .select(&OG_TITLE)
            .find_map(|meta| meta.value().attr("content").map(normalize))
            .filter(|t| !t.is_empty())
            .or_else(|| {
                document
                    .select(&TITLE)
                    .next()
                    .map(|t| element_text(&t))
                    .filter(|t| !t.is_empty())
            })
            .or_else(|| document.select(&H1).next().map(|h| element_text(&h)))
            .unwrap_or_default();

        self.strip_site_name(&raw)
    }

    /// Keeps the longest segment when the title carries a site name suffix or prefix.
    fn strip_site_name(&self, title: &str) -> String {
        let Some(separator) = self
            .config
            .title_separators
            .iter()
            .find(|sep| title.contains(sep.as_str()))
        else {
            return title.to_string();
        };

        title
            .split(separator.as_str())
            .map(str::trim)
            .fold("", |best, part| {
                if part.chars().count() > best.chars().count() {
                    part
                } else {
                    best
                }
            })
            .to_string()
    }

    /// Collects the regions excluded from this document.
    ///
    /// A match on `remove_tags` or the boilerplate class pattern is excluded
    /// unless it holds at least `wrapper_text_ratio` of the body's visible
    /// text, in which case it wraps the page layout (an ASP.NET `<form>`, a
    /// `div.page.has-sidebar`) rather than furniture. Script-like tags are
    /// always excluded.
    fn layout<'a>(&self, document: &'a Html) -> Layout<'a> {
        let Some(body) = document.select(&BODY).next() else {
            return Layout::default();
        };
        let threshold = visible_chars(&body) as f64 * self.config.wrapper_text_ratio;

        let regions = body
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| {
                let value = el.value();
                let removable = self.config.remove_tags.iter().any(|tag| tag == value.name());
                if removable && NON_CONTENT_TAGS.contains(&value.name()) {
                    return true;
                }
                let furniture = removable
                    || value.attr("class").is_some_and(|c| BOILERPLATE_CLASS.is_match(c))
                    || value.id().is_some_and(|id| BOILERPLATE_CLASS.is_match(id));
                furniture && (visible_chars(el) as f64) < threshold
            })
            .collect();

        Layout { regions }
    }

    fn content_root<'a>(&self, document: &'a Html, layout: &Layout<'a>) -> Option<ElementRef<'a>> {
        for selector in &self.content_selectors {
            let matched = document.select(selector).find(|candidate| {
                !layout.is_boilerplate(candidate)
                    && paragraph_chars(candidate, layout) >= self.config.min_content_chars
            });
            if let Some(root) = matched {
                debug!(root = root.value().name(), "Content root from selector");
                return Some(root);
            }
        }

        self.best_scored(document, layout)
            .or_else(|| document.select(&BODY).next())
    }

    fn best_scored<'a>(&self, document: &'a Html, layout: &Layout<'a>) -> Option<ElementRef<'a>> {
        let mut scores = IndexMap::new();

        for block in document.select(&SCORED) {
            if layout.is_boilerplate(&block) {
                continue;
            }
            let text = element_text(&block);
            let words = text.split_whitespace().count();
            if words < self.config.min_paragraph_words {
                continue;
            }

            let score = words as f64 * (1.0 - link_density(&block, &text));
            let Some(parent) = block.parent().and_then(ElementRef::wrap) else {
                continue;
            };
            *scores.entry(parent.id()).or_insert(0.0) += score;
            if let Some(grandparent) = parent.parent().and_then(ElementRef::wrap) {
                *scores.entry(grandparent.id()).or_insert(0.0) += score / 2.0;
            }
        }

        scores
            .into_iter()
            .filter(|(_, score)| *score > 0.0)
            .fold(None, |best, (id, score)| match best {
                Some((_, top)) if top >= score => best,
                _ => Some((id, score)),
            })
            .and_then(|(id, _)| document.tree.get(id))
            .and_then(ElementRef::wrap)
    }
}

/// Tags that never carry article text, whatever their size.
const NON_CONTENT_TAGS: [&str; 6] = ["script", "style", "noscript", "template", "svg", "iframe"];

/// Boilerplate regions of one parsed document.
#[derive(Default)]
struct Layout<'a> {
    regions: Vec<ElementRef<'a>>,
}

impl<'a> Layout<'a> {
    /// Whether the element lies inside an excluded region.
    fn is_boilerplate(&self, element: &ElementRef<'a>) -> bool {
        std::iter::once(*element)
            .chain(element.ancestors().filter_map(ElementRef::wrap))
            .any(|el| self.regions.contains(&el))
    }
}

/// Non-whitespace characters outside script-like tags.
fn visible_chars(element: &ElementRef<'_>) -> usize {
    element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent().and_then(ElementRef::wrap)?;
            (!NON_CONTENT_TAGS.contains(&parent.value().name())).then_some(&**text)
        })
        .map(|text| text.chars().filter(|c| !c.is_whitespace()).count())
        .sum()
}

fn paragraph_chars<'a>(root: &ElementRef<'a>, layout: &Layout<'a>) -> usize {
    root.select(&BLOCKS)
        .filter(|block| !layout.is_boilerplate(block))
        .map(|block| element_text(&block).chars().count())
        .sum()
}

fn body_text<'a>(root: ElementRef<'a>, layout: &Layout<'a>) -> String {
    let paragraphs: Vec<String> = root
        .select(&BLOCKS)
        .filter(|block| !layout.is_boilerplate(block) && !nested_block(block, &root))
        .map(|block| element_text(&block))
        .filter(|text| !text.is_empty())
        .collect();

    if !paragraphs.is_empty() {
        return paragraphs.join("\n\n");
    }

    let text: Vec<&str> = root
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent().and_then(ElementRef::wrap)?;
            (!layout.is_boilerplate(&parent)).then_some(&**text)
        })
        .collect();
    normalize(&text.join(" "))
}

/// Whether a block sits inside another block below `root`.
fn nested_block(block: &ElementRef<'_>, root: &ElementRef<'_>) -> bool {
    block
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take_while(|ancestor| ancestor.id() != root.id())
        .any(|ancestor| matches!(ancestor.value().name(), "p" | "pre" | "blockquote"))
}

/// Share of an element's text that sits inside links.
fn link_density(element: &ElementRef<'_>, text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let linked: usize = element
        .select(&ANCHOR)
        .map(|a| element_text(&a).chars().count())
        .sum();
    (linked as f64 / total as f64).min(1.0)
}

/// Fetches pages and extracts article records from them.
pub struct ArticleExtractor {
    fetcher: Arc<dyn Fetcher>,
    parser: ArticleParser,
}

impl ArticleExtractor {
    /// Creates a new article extractor.
    pub fn new(fetcher: Arc<dyn Fetcher>, config: ArticleConfig) -> Result<Self, ScraperError> {
        Ok(Self {
            fetcher,
            parser: ArticleParser::new(config)?,
        })
    }

    /// Gets the parser.
    #[must_use]
    pub const fn parser(&self) -> &ArticleParser {
        &self.parser
    }
}

#[async_trait]
impl PageExtractor for ArticleExtractor {
    type Record = ArticleRecord;

    async fn extract(&self, url: &str) -> Result<ArticleRecord, ScraperError> {
        let response = self.fetcher.fetch(url).await?;
        let record = self.parser.parse(&response.text, url);
        debug!(url = %url, words = record.word_count(), "Extracted article");
        Ok(record)
    }
}
