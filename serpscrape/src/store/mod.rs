//! Document storage.
//!
//! Records are persisted as JSON documents in named collections. A backend
//! implements [`DocumentStore`]; [`RecordCollection`] layers typed dedup
//! queries on top and [`Paginator`] serves fixed-size pages.

mod collection;
mod memory;
mod paginator;
mod sqlite;

pub use collection::RecordCollection;
pub use memory::MemoryStore;
pub use paginator::Paginator;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt::Debug;
use std::sync::Arc;

use crate::config::{StoreBackend, StoreConfig};
use crate::errors::StoreError;

/// A stored JSON document.
pub type Document = Map<String, Value>;

/// Field holding the store-assigned identifier.
pub const ID_FIELD: &str = "_id";

/// Generates a new, time-ordered document identifier.
#[must_use]
pub fn new_document_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Assigns an identifier unless the document already carries one; returns it.
pub(crate) fn assign_id(document: &mut Document) -> String {
    if let Some(Value::String(id)) = document.get(ID_FIELD) {
        return id.clone();
    }
    let id = new_document_id();
    document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
    id
}

/// Equality filter on a single top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Field name.
    pub field: String,
    /// Expected value.
    pub value: Value,
}

impl Filter {
    /// Matches documents whose `field` equals `value`.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether a document satisfies the filter.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        document.get(&self.field) == Some(&self.value)
    }
}

/// A document store holding named collections.
///
/// Documents are returned in insertion order. Every operation fails with
/// [`StoreError`] once [`DocumentStore::close`] has been called.
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    /// Returns the first document matching `filter`.
    async fn find_one(&self, collection: &str, filter: &Filter)
        -> Result<Option<Document>, StoreError>;

    /// Whether any document matches `filter`.
    async fn exists(&self, collection: &str, filter: &Filter) -> Result<bool, StoreError> {
        Ok(self.find_one(collection, filter).await?.is_some())
    }

    /// Inserts a document and returns its identifier.
    async fn insert_one(&self, collection: &str, document: Document) -> Result<String, StoreError>;

    /// Inserts documents in order and returns their identifiers.
    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<Vec<String>, StoreError>;

    /// Counts the documents in a collection.
    async fn count(&self, collection: &str) -> Result<u64, StoreError>;

    /// Returns up to `limit` documents after skipping `skip`, in natural order.
    async fn find_window(
        &self,
        collection: &str,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Document>, StoreError>;

    /// Closes the store; later operations fail.
    async fn close(&self) -> Result<(), StoreError>;
}

/// Opens the backend selected by configuration.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Sqlite => Ok(Arc::new(SqliteStore::open(&config.database_path).await?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_filter_matches() {
        let filter = Filter::eq("url", "http://a.test");
        assert!(filter.matches(&doc(json!({"url": "http://a.test"}))));
        assert!(!filter.matches(&doc(json!({"url": "http://b.test"}))));
        assert!(!filter.matches(&doc(json!({"title": "x"}))));
    }

    #[test]
    fn test_assign_id_keeps_existing() {
        let mut existing = doc(json!({"_id": "fixed"}));
        assert_eq!(assign_id(&mut existing), "fixed");

        let mut fresh = doc(json!({"url": "http://a.test"}));
        let id = assign_id(&mut fresh);
        assert_eq!(fresh[ID_FIELD], Value::String(id.clone()));
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[tokio::test]
    async fn test_open_memory_store() {
        let store = open_store(&StoreConfig::default()).await.unwrap();
        assert_eq!(store.count("web_data").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_open_sqlite_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scraped.db");
        let store = open_store(&StoreConfig::sqlite(&path)).await.unwrap();
        store.insert_one("web_data", doc(json!({"url": "http://a.test"}))).await.unwrap();
        assert_eq!(store.count("web_data").await.unwrap(), 1);
        assert!(path.exists());
    }
}
