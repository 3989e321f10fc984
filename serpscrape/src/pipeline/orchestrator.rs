//! Search, dedup, extract and store, for one query.

use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::policy::{DedupHitPolicy, InsertMode, PipelineOptions};
use crate::errors::{ScraperError, StoreError};
use crate::events::{event_payload, EventSink, NoOpEventSink};
use crate::observability::SpanTimer;
use crate::pacing::{NoDelay, RateLimiter};
use crate::store::RecordCollection;
use crate::websearch::{PageExtractor, Record, ResultFinder, SearchResult, Stored};

/// Counters describing one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Results returned by the finder.
    pub candidates: usize,
    /// Results repeating a URL seen earlier in the batch.
    pub duplicates: usize,
    /// Stored URLs left out of the output.
    pub skipped: usize,
    /// Stored URLs returned without refetching.
    pub included: usize,
    /// Pages fetched and extracted.
    pub extracted: usize,
    /// Pages whose fetch or extraction failed recoverably.
    pub failed: usize,
    /// Records written to the store.
    pub stored: usize,
}

/// Records returned by a run together with its counters.
#[derive(Debug, Clone)]
pub struct RunOutcome<R> {
    /// Records in processing order.
    pub records: Vec<Stored<R>>,
    /// Run counters.
    pub stats: RunStats,
}

enum Slot<R> {
    Pending(usize),
    Done(Stored<R>),
}

/// Runs one extractor over the results of a search.
pub struct Pipeline<E: PageExtractor> {
    options: PipelineOptions,
    finder: Arc<dyn ResultFinder>,
    extractor: E,
    records: RecordCollection<E::Record>,
    limiter: Arc<dyn RateLimiter>,
    events: Arc<dyn EventSink>,
}

impl<E: PageExtractor> Pipeline<E> {
    /// Creates a pipeline with no pacing and no event sink.
    #[must_use]
    pub fn new(
        options: PipelineOptions,
        finder: Arc<dyn ResultFinder>,
        extractor: E,
        records: RecordCollection<E::Record>,
    ) -> Self {
        Self {
            options,
            finder,
            extractor,
            records,
            limiter: Arc::new(NoDelay),
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the limiter awaited before each page fetch.
    #[must_use]
    pub fn with_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Gets the options.
    #[must_use]
    pub const fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Gets the record collection.
    #[must_use]
    pub const fn records(&self) -> &RecordCollection<E::Record> {
        &self.records
    }

    /// Runs the pipeline and returns the records in processing order.
    pub async fn run(&self, query: &str) -> Result<Vec<Stored<E::Record>>, ScraperError> {
        Ok(self.run_detailed(query).await?.records)
    }

    /// Runs the pipeline and returns records and counters.
    pub async fn run_detailed(&self, query: &str) -> Result<RunOutcome<E::Record>, ScraperError> {
        let timer = SpanTimer::start(format!("{}.run", self.options.name));
        let mut stats = RunStats::default();

        let candidates = self.search(query).await?;
        stats.candidates = candidates.len();

        let mut seen = HashSet::new();
        let mut slots = Vec::with_capacity(candidates.len());
        let mut pending = Vec::new();

        for candidate in candidates {
            let SearchResult { url, snippet } = candidate;

            if !seen.insert(url.clone()) {
                stats.duplicates += 1;
                debug!(pipeline = %self.options.name, url = %url, "Duplicate result in batch");
                self.emit("url.duplicate", &url).await;
                continue;
            }

            match self.options.on_dedup_hit {
                DedupHitPolicy::SkipAndOmit => {
                    if self.records.exists(&url).await? {
                        stats.skipped += 1;
                        debug!(pipeline = %self.options.name, url = %url, "Already stored, skipping");
                        self.emit("url.skipped", &url).await;
                        continue;
                    }
                }
                DedupHitPolicy::SkipAndInclude => {
                    if let Some(existing) = self.records.find_by_url(&url).await? {
                        stats.included += 1;
                        debug!(pipeline = %self.options.name, url = %url, "Already stored, including");
                        self.emit("url.included", &url).await;
                        slots.push(Slot::Done(existing));
                        continue;
                    }
                }
            }

            self.limiter.wait().await;
            let mut record = match self.extractor.extract(&url).await {
                Ok(record) => record,
                Err(err) if err.is_recoverable() => {
                    stats.failed += 1;
                    warn!(
                        pipeline = %self.options.name,
                        url = %url,
                        kind = %err.kind(),
                        error = %err,
                        "Skipping page"
                    );
                    self.emit_with("url.failed", json!({"url": url, "kind": err.kind(), "error": err.to_string()}))
                        .await;
                    continue;
                }
                Err(err) => return Err(err),
            };

            if self.options.attach_snippet {
                record.set_result_text(snippet);
            }
            stats.extracted += 1;
            self.emit("url.extracted", &url).await;

            match self.options.insert_mode {
                InsertMode::Immediate => {
                    let id = self.records.insert_one(&record).await?;
                    stats.stored += 1;
                    slots.push(Slot::Done(Stored::new(id, record)));
                }
                InsertMode::Batch => {
                    slots.push(Slot::Pending(pending.len()));
                    pending.push(record);
                }
            }
        }

        let mut inserted = self.flush(pending).await?;
        stats.stored += inserted.len();

        let records = slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Done(stored) => Some(stored),
                Slot::Pending(index) => inserted.get_mut(index).and_then(Option::take),
            })
            .collect::<Vec<_>>();

        let duration_ms = timer.finish();
        info!(
            pipeline = %self.options.name,
            query = %query,
            candidates = stats.candidates,
            extracted = stats.extracted,
            skipped = stats.skipped + stats.duplicates,
            failed = stats.failed,
            returned = records.len(),
            duration_ms,
            "Pipeline run completed"
        );
        self.emit_with(
            "run.completed",
            json!({"query": query, "stats": stats, "returned": records.len(), "duration_ms": duration_ms}),
        )
        .await;

        Ok(RunOutcome { records, stats })
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ScraperError> {
        match self.finder.find(query).await {
            Ok(results) => {
                debug!(pipeline = %self.options.name, query = %query, results = results.len(), "Search completed");
                self.emit_with("search.completed", json!({"query": query, "results": results.len()}))
                    .await;
                Ok(results)
            }
            Err(err) if err.is_recoverable() => {
                warn!(
                    pipeline = %self.options.name,
                    query = %query,
                    kind = %err.kind(),
                    error = %err,
                    "Search failed, continuing with no results"
                );
                self.emit_with("search.failed", json!({"query": query, "error": err.to_string()}))
                    .await;
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Bulk-inserts batched records and pairs them with their identifiers.
    async fn flush(
        &self,
        pending: Vec<E::Record>,
    ) -> Result<Vec<Option<Stored<E::Record>>>, ScraperError> {
        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let ids = self.records.insert_batch(&pending).await?;
        if ids.len() != pending.len() {
            return Err(StoreError::new(
                self.records.name(),
                format!("inserted {} records but got {} identifiers", pending.len(), ids.len()),
            )
            .into());
        }

        debug!(pipeline = %self.options.name, count = ids.len(), "Stored batch");
        self.emit_with("batch.stored", json!({"count": ids.len()})).await;

        Ok(pending
            .into_iter()
            .zip(ids)
            .map(|(record, id)| Some(Stored::new(id, record)))
            .collect())
    }

    async fn emit(&self, event_type: &str, url: &str) {
        self.emit_with(event_type, json!({ "url": url })).await;
    }

    async fn emit_with(&self, event_type: &str, fields: serde_json::Value) {
        self.events
            .emit(event_type, Some(event_payload(&self.options.name, fields)))
            .await;
    }
}

impl<E: PageExtractor> std::fmt::Debug for Pipeline<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("options", &self.options)
            .field("records", &self.records)
            .finish_non_exhaustive()
    }
}
