//! Error types for serpscrape.
//!
//! Every fallible operation returns a [`ScraperError`]. The orchestrator
//! decides between "skip this item" and "abort the run" by matching on
//! [`ScraperError::kind`], never by catching everything.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The main error type for serpscrape operations.
#[derive(Debug, Error)]
pub enum ScraperError {
    /// A network or HTTP failure reaching a target site or the search engine.
    #[error("{0}")]
    Fetch(#[from] FetchError),

    /// Malformed or unexpected HTML shape.
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// A required request field was missing or invalid.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A page number beyond the available pages.
    #[error("{0}")]
    OutOfRange(#[from] OutOfRangeError),

    /// A document store failure.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ScraperError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Coarse classification used to decide how a failure propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network/HTTP failure; recovered locally.
    UpstreamFetch,
    /// Unexpected HTML shape; recovered locally.
    Parse,
    /// Bad request shape; surfaced as a client error.
    Validation,
    /// Page beyond the collection; surfaced as a client error.
    OutOfRange,
    /// Anything else; surfaced as a generic server error.
    Unclassified,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UpstreamFetch => "upstream_fetch",
            Self::Parse => "parse",
            Self::Validation => "validation",
            Self::OutOfRange => "out_of_range",
            Self::Unclassified => "unclassified",
        };
        write!(f, "{s}")
    }
}

impl ScraperError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the failure kind of this error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Fetch(_) => FailureKind::UpstreamFetch,
            Self::Parse(_) => FailureKind::Parse,
            Self::Validation(_) => FailureKind::Validation,
            Self::OutOfRange(_) => FailureKind::OutOfRange,
            Self::Store(_)
            | Self::Internal(_)
            | Self::Serialization(_)
            | Self::Io(_) => FailureKind::Unclassified,
        }
    }

    /// Whether the pipeline may recover by skipping the affected item.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self.kind(), FailureKind::UpstreamFetch | FailureKind::Parse)
    }

    /// Whether the error is the caller's fault.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self.kind(), FailureKind::Validation | FailureKind::OutOfRange)
    }
}

/// Error raised when a fetch does not produce a usable response.
#[derive(Debug, Clone, Error)]
#[error("Fetch failed for '{url}': {message}")]
pub struct FetchError {
    /// The URL that was requested.
    pub url: String,
    /// HTTP status if a response arrived.
    pub status: Option<u16>,
    /// Description of the failure.
    pub message: String,
}

impl FetchError {
    /// Creates a new fetch error.
    #[must_use]
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Sets the HTTP status.
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Error raised when HTML cannot be interpreted.
#[derive(Debug, Clone, Error)]
#[error("Parse error in {context}: {message}")]
pub struct ParseError {
    /// What was being parsed (a URL, a selector, ...).
    pub context: String,
    /// Description of the failure.
    pub message: String,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Creates an error for a CSS selector that failed to compile.
    #[must_use]
    pub fn selector(selector: &str, message: impl Into<String>) -> Self {
        Self::new(format!("selector '{selector}'"), message)
    }
}

/// Error raised when a request is missing a required field.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// The offending field.
    pub field: String,
    /// Human readable message returned to the caller.
    pub message: String,
}

impl ValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates the error for a missing required field.
    #[must_use]
    pub fn missing(field: &str) -> Self {
        let label = match field {
            "search" => "Search term".to_string(),
            other => other.to_string(),
        };
        Self::new(field, format!("{label} field is required"))
    }
}

/// Error raised when a page number is beyond the available pages.
#[derive(Debug, Clone, Error)]
#[error("Page number out of range: page {page_num} of {total_pages}")]
pub struct OutOfRangeError {
    /// Requested page.
    pub page_num: u64,
    /// Number of pages available.
    pub total_pages: u64,
}

impl OutOfRangeError {
    /// Creates a new out-of-range error.
    #[must_use]
    pub const fn new(page_num: u64, total_pages: u64) -> Self {
        Self {
            page_num,
            total_pages,
        }
    }
}

/// Error raised by a document store backend.
#[derive(Debug, Clone, Error)]
#[error("Store error on collection '{collection}': {message}")]
pub struct StoreError {
    /// Collection involved.
    pub collection: String,
    /// Description of the failure.
    pub message: String,
}

impl StoreError {
    /// Creates a new store error.
    #[must_use]
    pub fn new(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Creates the error returned after the store was closed.
    #[must_use]
    pub fn closed(collection: impl Into<String>) -> Self {
        Self::new(collection, "store is closed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let fetch: ScraperError = FetchError::new("http://a.test", "connection refused").into();
        assert_eq!(fetch.kind(), FailureKind::UpstreamFetch);
        assert!(fetch.is_recoverable());

        let parse: ScraperError = ParseError::selector("div[", "unexpected end").into();
        assert_eq!(parse.kind(), FailureKind::Parse);
        assert!(parse.is_recoverable());

        let store: ScraperError = StoreError::closed("web_data").into();
        assert_eq!(store.kind(), FailureKind::Unclassified);
        assert!(!store.is_recoverable());
        assert!(!store.is_client_error());
    }

    #[test]
    fn test_client_errors() {
        let missing: ScraperError = ValidationError::missing("search").into();
        assert!(missing.is_client_error());
        assert_eq!(missing.to_string(), "Search term field is required");

        let range: ScraperError = OutOfRangeError::new(5, 2).into();
        assert_eq!(range.kind(), FailureKind::OutOfRange);
        assert!(range.is_client_error());
        assert!(range.to_string().starts_with("Page number out of range"));
    }

    #[test]
    fn test_fetch_error_status() {
        let err = FetchError::new("http://a.test", "not found").with_status(404);
        assert_eq!(err.status, Some(404));
        assert!(err.to_string().contains("http://a.test"));
    }

    #[test]
    fn test_serde_json_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let converted: ScraperError = err.into();
        assert_eq!(converted.kind(), FailureKind::Unclassified);
    }

    #[test]
    fn test_failure_kind_display() {
        assert_eq!(FailureKind::UpstreamFetch.to_string(), "upstream_fetch");
        assert_eq!(FailureKind::OutOfRange.to_string(), "out_of_range");
    }
}
