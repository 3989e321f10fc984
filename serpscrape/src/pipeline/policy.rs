//! Per-pipeline behaviour switches.

use serde::{Deserialize, Serialize};

/// What to do with a URL that is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupHitPolicy {
    /// Do not refetch and leave it out of the results.
    SkipAndOmit,
    /// Do not refetch but return the stored record.
    SkipAndInclude,
}

/// When new records are written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertMode {
    /// One bulk insert after every URL has been processed.
    Batch,
    /// One insert per URL, right after extraction.
    Immediate,
}

/// Options distinguishing the structured and article pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Name used in logs and events.
    pub name: String,
    /// Dedup-hit behaviour.
    pub on_dedup_hit: DedupHitPolicy,
    /// Insert timing.
    pub insert_mode: InsertMode,
    /// Whether the search snippet is attached as `result_text`.
    pub attach_snippet: bool,
}

impl PipelineOptions {
    /// Options for the structured pipeline.
    #[must_use]
    pub fn structured() -> Self {
        Self {
            name: "structured".to_string(),
            on_dedup_hit: DedupHitPolicy::SkipAndOmit,
            insert_mode: InsertMode::Batch,
            attach_snippet: true,
        }
    }

    /// Options for the article pipeline.
    #[must_use]
    pub fn article() -> Self {
        Self {
            name: "article".to_string(),
            on_dedup_hit: DedupHitPolicy::SkipAndInclude,
            insert_mode: InsertMode::Immediate,
            attach_snippet: false,
        }
    }

    /// Overrides the dedup-hit policy.
    #[must_use]
    pub const fn with_dedup_hit(mut self, policy: DedupHitPolicy) -> Self {
        self.on_dedup_hit = policy;
        self
    }

    /// Overrides the insert mode.
    #[must_use]
    pub const fn with_insert_mode(mut self, mode: InsertMode) -> Self {
        self.insert_mode = mode;
        self
    }
}
