//! Fixed-size pages over a record collection.

use tracing::debug;

use super::RecordCollection;
use crate::errors::{OutOfRangeError, ScraperError, ValidationError};
use crate::websearch::{Page, Record, Stored};

/// Serves 1-indexed pages of stored records in insertion order.
#[derive(Debug, Clone)]
pub struct Paginator<R> {
    records: RecordCollection<R>,
}

impl<R: Record> Paginator<R> {
    /// Creates a paginator over a collection.
    #[must_use]
    pub const fn new(records: RecordCollection<R>) -> Self {
        Self { records }
    }

    /// Returns page `page_num` of `page_size` records.
    ///
    /// `total_pages` is `ceil(total_count / page_size)`. A page beyond it is an
    /// [`OutOfRangeError`], so an empty collection has no valid page.
    pub async fn page(&self, page_num: u64, page_size: u64) -> Result<Page<Stored<R>>, ScraperError> {
        if page_size == 0 {
            return Err(ValidationError::new("page_size", "Page size must be at least 1").into());
        }
        if page_num == 0 {
            return Err(ValidationError::new("page_num", "Page number must be at least 1").into());
        }

        let total_count = self.records.count().await?;
        let total_pages = total_count.div_ceil(page_size);

        if page_num > total_pages {
            return Err(OutOfRangeError::new(page_num, total_pages).into());
        }

        let skip = (page_num - 1).saturating_mul(page_size);
        let items = self.records.window(skip, page_size).await?;
        debug!(
            collection = %self.records.name(),
            page_num,
            page_size,
            total_pages,
            items = items.len(),
            "Served page"
        );

        Ok(Page {
            total_count,
            total_pages,
            page_num,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use crate::store::MemoryStore;
    use crate::websearch::ArticleRecord;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    async fn paginator_with(count: usize) -> Paginator<ArticleRecord> {
        let records = RecordCollection::new(Arc::new(MemoryStore::new()), "extracted_data");
        let batch: Vec<_> = (0..count)
            .map(|i| ArticleRecord::new(format!("http://{i}.test"), format!("T{i}"), "body"))
            .collect();
        records.insert_batch(&batch).await.unwrap();
        Paginator::new(records)
    }

    #[tokio::test]
    async fn test_last_page_is_partial() {
        let paginator = paginator_with(25).await;
        let page = paginator.page(3, 10).await.unwrap();
        assert_eq!(page.total_count, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.items[0].record.url, "http://20.test");
        assert!(!page.has_next());
        assert!(page.has_prev());
    }

    #[tokio::test]
    async fn test_pages_partition_collection() {
        let paginator = paginator_with(23).await;
        let mut urls = Vec::new();
        for page_num in 1..=5 {
            let page = paginator.page(page_num, 5).await.unwrap();
            assert_eq!(page.total_pages, 5);
            urls.extend(page.items.into_iter().map(|s| s.record.url));
        }
        let expected: Vec<_> = (0..23).map(|i| format!("http://{i}.test")).collect();
        assert_eq!(urls, expected);
    }

    #[tokio::test]
    async fn test_page_past_end_is_out_of_range() {
        let paginator = paginator_with(25).await;
        let err = paginator.page(4, 10).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::OutOfRange);
        assert_eq!(err.to_string(), "Page number out of range: page 4 of 3");
    }

    #[tokio::test]
    async fn test_empty_collection_has_no_pages() {
        let paginator = paginator_with(0).await;
        let err = paginator.page(1, 10).await.unwrap_err();
        assert_eq!(err.to_string(), "Page number out of range: page 1 of 0");
    }

    #[tokio::test]
    async fn test_zero_arguments_are_validation_errors() {
        let paginator = paginator_with(3).await;
        assert_eq!(paginator.page(1, 0).await.unwrap_err().kind(), FailureKind::Validation);
        assert_eq!(paginator.page(0, 10).await.unwrap_err().kind(), FailureKind::Validation);
    }
}
