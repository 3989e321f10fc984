//! Typed record collections with URL deduplication.

use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{Document, DocumentStore, Filter};
use crate::errors::{ScraperError, StoreError};
use crate::websearch::{Record, Stored};

/// A named collection of records of one type, keyed by URL.
pub struct RecordCollection<R> {
    store: Arc<dyn DocumentStore>,
    name: String,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for RecordCollection<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            name: self.name.clone(),
            _record: PhantomData,
        }
    }
}

impl<R> fmt::Debug for RecordCollection<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordCollection")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<R: Record> RecordCollection<R> {
    /// Binds a collection name on a store.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, name: impl Into<String>) -> Self {
        Self {
            store,
            name: name.into(),
            _record: PhantomData,
        }
    }

    /// Gets the collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Whether a record for `url` has been stored. The record is not decoded.
    pub async fn exists(&self, url: &str) -> Result<bool, ScraperError> {
        Ok(self.store.exists(&self.name, &Filter::eq("url", url)).await?)
    }

    /// Returns the stored record for `url`, if any.
    pub async fn find_by_url(&self, url: &str) -> Result<Option<Stored<R>>, ScraperError> {
        self.store
            .find_one(&self.name, &Filter::eq("url", url))
            .await?
            .map(decode)
            .transpose()
    }

    /// Stores one record and returns its identifier.
    pub async fn insert_one(&self, record: &R) -> Result<String, ScraperError> {
        let document = self.encode(record)?;
        Ok(self.store.insert_one(&self.name, document).await?)
    }

    /// Stores records in order and returns their identifiers.
    pub async fn insert_batch(&self, records: &[R]) -> Result<Vec<String>, ScraperError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let documents = records
            .iter()
            .map(|record| self.encode(record))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.store.insert_many(&self.name, documents).await?)
    }

    /// Counts stored records.
    pub async fn count(&self) -> Result<u64, ScraperError> {
        Ok(self.store.count(&self.name).await?)
    }

    /// Returns up to `limit` records after skipping `skip`, in insertion order.
    pub async fn window(&self, skip: u64, limit: u64) -> Result<Vec<Stored<R>>, ScraperError> {
        self.store
            .find_window(&self.name, skip, limit)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    fn encode(&self, record: &R) -> Result<Document, ScraperError> {
        match serde_json::to_value(record)? {
            Value::Object(document) => Ok(document),
            other => Err(StoreError::new(
                &self.name,
                format!("record must serialize to an object, got {other}"),
            )
            .into()),
        }
    }
}

fn decode<R: Record>(document: Document) -> Result<Stored<R>, ScraperError> {
    Ok(serde_json::from_value(Value::Object(document))?)
}
