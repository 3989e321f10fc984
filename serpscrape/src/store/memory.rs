//! In-memory document store.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{assign_id, Document, DocumentStore, Filter};
use crate::errors::StoreError;

/// Keeps collections in process memory. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<String, Vec<Document>>,
    closed: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self, collection: &str) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::closed(collection));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        self.ensure_open(collection)?;
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| filter.matches(doc)).cloned()))
    }

    async fn insert_one(&self, collection: &str, mut document: Document) -> Result<String, StoreError> {
        self.ensure_open(collection)?;
        let id = assign_id(&mut document);
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(id)
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<Vec<String>, StoreError> {
        self.ensure_open(collection)?;
        let mut entry = self.collections.entry(collection.to_string()).or_default();
        let ids = documents
            .into_iter()
            .map(|mut document| {
                let id = assign_id(&mut document);
                entry.push(document);
                id
            })
            .collect();
        Ok(ids)
    }

    async fn count(&self, collection: &str) -> Result<u64, StoreError> {
        self.ensure_open(collection)?;
        Ok(self
            .collections
            .get(collection)
            .map_or(0, |docs| docs.len() as u64))
    }

    async fn find_window(
        &self,
        collection: &str,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Document>, StoreError> {
        self.ensure_open(collection)?;
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self.collections.get(collection).map_or_else(Vec::new, |docs| {
            docs.iter().skip(skip).take(limit).cloned().collect()
        }))
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn doc(url: &str) -> Document {
        let Value::Object(map) = json!({ "url": url }) else {
            unreachable!()
        };
        map
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryStore::new();
        let id = store.insert_one("web_data", doc("http://a.test")).await.unwrap();

        let found = store
            .find_one("web_data", &Filter::eq("url", "http://a.test"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found["_id"], Value::String(id));
        assert!(store
            .find_one("web_data", &Filter::eq("url", "http://b.test"))
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_one("extracted_data", &Filter::eq("url", "http://a.test"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_insert_many_keeps_order() {
        let store = MemoryStore::new();
        let ids = store
            .insert_many("web_data", vec![doc("http://a.test"), doc("http://b.test"), doc("http://c.test")])
            .await
            .unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(store.count("web_data").await.unwrap(), 3);

        let window = store.find_window("web_data", 1, 5).await.unwrap();
        let urls: Vec<_> = window.iter().map(|d| d["url"].as_str().unwrap()).collect();
        assert_eq!(urls, vec!["http://b.test", "http://c.test"]);
    }

    #[tokio::test]
    async fn test_window_past_end_is_empty() {
        let store = MemoryStore::new();
        store.insert_one("web_data", doc("http://a.test")).await.unwrap();
        assert!(store.find_window("web_data", 5, 5).await.unwrap().is_empty());
        assert!(store.find_window("missing", 0, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_store_rejects_operations() {
        let store = MemoryStore::new();
        store.close().await.unwrap();
        let err = store.count("web_data").await.unwrap_err();
        assert_eq!(err.collection, "web_data");
        assert!(store.insert_one("web_data", doc("http://a.test")).await.is_err());
    }
}
