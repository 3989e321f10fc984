//! SQLite document store.
//!
//! All collections share one `documents` table. Each row keeps the document
//! as JSON text next to its collection, `_id` and `url`; the autoincrement
//! `seq` column preserves insertion order. `(collection, url)` is indexed so
//! dedup lookups do not scan.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::{assign_id, Document, DocumentStore, Filter};
use crate::errors::StoreError;

/// Field served by the `(collection, url)` index.
const URL_FIELD: &str = "url";

/// Persists collections in a SQLite database.
#[derive(Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::new("*", format!("cannot open {}: {e}", path.display())))?;

        info!(database = %path.display(), "Opened SQLite store");
        Self::with_pool(pool).await
    }

    /// Connects with a SQLite URL such as `sqlite://scraped.db?mode=rwc`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::new("*", e.to_string()))?;
        Self::with_pool(pool).await
    }

    /// Creates a store in a private in-memory database.
    ///
    /// Every pooled connection to `sqlite::memory:` sees its own database, so
    /// the pool holds exactly one connection and never recycles it.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::new("*", e.to_string()))?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                url TEXT,
                body TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::new("*", e.to_string()))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection_url ON documents(collection, url)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::new("*", e.to_string()))?;

        Ok(())
    }

    fn ensure_open(&self, collection: &str) -> Result<(), StoreError> {
        if self.pool.is_closed() {
            return Err(StoreError::closed(collection));
        }
        Ok(())
    }

    async fn insert(&self, collection: &str, documents: Vec<Document>) -> Result<Vec<String>, StoreError> {
        self.ensure_open(collection)?;
        let db_err = |e: sqlx::Error| StoreError::new(collection, e.to_string());

        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut ids = Vec::with_capacity(documents.len());
        for mut document in documents {
            let id = assign_id(&mut document);
            let url = document
                .get(URL_FIELD)
                .and_then(Value::as_str)
                .map(ToString::to_string);
            let body = serde_json::to_string(&document)
                .map_err(|e| StoreError::new(collection, e.to_string()))?;

            sqlx::query("INSERT INTO documents (collection, id, url, body) VALUES (?, ?, ?, ?)")
                .bind(collection)
                .bind(&id)
                .bind(url)
                .bind(body)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            ids.push(id);
        }
        tx.commit().await.map_err(db_err)?;
        Ok(ids)
    }

    /// Looks up by the indexed `url` column.
    async fn find_by_url(&self, collection: &str, url: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, (String,)>(
            "SELECT body FROM documents WHERE collection = ? AND url = ? ORDER BY seq LIMIT 1",
        )
        .bind(collection)
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::new(collection, e.to_string()))?;

        row.map(|(body,)| decode(collection, &body)).transpose()
    }
}

fn decode(collection: &str, body: &str) -> Result<Document, StoreError> {
    serde_json::from_str(body).map_err(|e| StoreError::new(collection, format!("corrupt document: {e}")))
}

fn url_value(filter: &Filter) -> Option<&str> {
    (filter.field == URL_FIELD).then(|| filter.value.as_str()).flatten()
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        self.ensure_open(collection)?;
        if let Some(url) = url_value(filter) {
            return self.find_by_url(collection, url).await;
        }

        // Other fields are not indexed; decode in order until one matches.
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT body FROM documents WHERE collection = ? ORDER BY seq",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::new(collection, e.to_string()))?;

        for (body,) in rows {
            let document = decode(collection, &body)?;
            if filter.matches(&document) {
                return Ok(Some(document));
            }
        }
        Ok(None)
    }

    async fn exists(&self, collection: &str, filter: &Filter) -> Result<bool, StoreError> {
        self.ensure_open(collection)?;
        let Some(url) = url_value(filter) else {
            return Ok(self.find_one(collection, filter).await?.is_some());
        };

        let row = sqlx::query_as::<_, (i64,)>(
            "SELECT 1 FROM documents WHERE collection = ? AND url = ? LIMIT 1",
        )
        .bind(collection)
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::new(collection, e.to_string()))?;
        Ok(row.is_some())
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<String, StoreError> {
        let mut ids = self.insert(collection, vec![document]).await?;
        ids.pop()
            .ok_or_else(|| StoreError::new(collection, "insert returned no identifier"))
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<Vec<String>, StoreError> {
        if documents.is_empty() {
            self.ensure_open(collection)?;
            return Ok(Vec::new());
        }
        self.insert(collection, documents).await
    }

    async fn count(&self, collection: &str) -> Result<u64, StoreError> {
        self.ensure_open(collection)?;
        let (count,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::new(collection, e.to_string()))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn find_window(
        &self,
        collection: &str,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Document>, StoreError> {
        self.ensure_open(collection)?;
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT body FROM documents WHERE collection = ? ORDER BY seq LIMIT ? OFFSET ?",
        )
        .bind(collection)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(skip).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::new(collection, e.to_string()))?;

        rows.iter().map(|(body,)| decode(collection, body)).collect()
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.pool.close().await;
        debug!("Closed SQLite store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc(url: &str) -> Document {
        let Value::Object(map) = json!({ "url": url, "title": "T" }) else {
            unreachable!()
        };
        map
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scraped.db");

        let store = SqliteStore::open(&path).await.unwrap();
        let id = store.insert_one("web_data", doc("http://a.test")).await.unwrap();
        store
            .insert_many("web_data", vec![doc("http://b.test"), doc("http://c.test")])
            .await
            .unwrap();
        store.close().await.unwrap();

        let reopened = SqliteStore::open(&path).await.unwrap();
        assert_eq!(reopened.count("web_data").await.unwrap(), 3);
        let found = reopened
            .find_one("web_data", &Filter::eq("url", "http://a.test"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found["_id"], Value::String(id));

        let window = reopened.find_window("web_data", 2, 10).await.unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0]["url"], "http://c.test");
    }

    #[tokio::test]
    async fn test_collections_are_separate_and_ordered() {
        let store = SqliteStore::in_memory().await.unwrap();
        store
            .insert_many("web_data", vec![doc("http://a.test"), doc("http://b.test"), doc("http://c.test")])
            .await
            .unwrap();
        store.insert_one("articles", doc("http://a.test")).await.unwrap();

        assert_eq!(store.count("web_data").await.unwrap(), 3);
        assert_eq!(store.count("articles").await.unwrap(), 1);
        assert_eq!(store.count("missing").await.unwrap(), 0);

        let urls: Vec<Value> = store
            .find_window("web_data", 1, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d["url"].clone())
            .collect();
        assert_eq!(urls, vec![json!("http://b.test"), json!("http://c.test")]);
        assert!(store.find_window("web_data", 5, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exists_and_unindexed_filter() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.insert_one("web_data", doc("http://a.test")).await.unwrap();

        assert!(store.exists("web_data", &Filter::eq("url", "http://a.test")).await.unwrap());
        assert!(!store.exists("web_data", &Filter::eq("url", "http://b.test")).await.unwrap());
        assert!(!store.exists("articles", &Filter::eq("url", "http://a.test")).await.unwrap());

        let found = store
            .find_one("web_data", &Filter::eq("title", "T"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found["url"], "http://a.test");
        assert!(store.find_one("web_data", &Filter::eq("title", 7)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_caller_supplied_id_is_kept() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut document = doc("http://a.test");
        document.insert("_id".to_string(), json!("fixed"));
        assert_eq!(store.insert_one("web_data", document).await.unwrap(), "fixed");
    }

    #[tokio::test]
    async fn test_closed_store_rejects_operations() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.close().await.unwrap();
        let err = store.find_window("web_data", 0, 1).await.unwrap_err();
        assert_eq!(err.message, "store is closed");
        assert!(store.insert_many("web_data", vec![doc("http://a.test")]).await.is_err());
        assert!(store.exists("web_data", &Filter::eq("url", "x")).await.is_err());
    }
}
