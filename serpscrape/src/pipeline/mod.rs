//! Pipeline orchestration.
//!
//! This module provides:
//! - The generic search → dedup → extract → store [`Pipeline`]
//! - Per-pipeline dedup-hit and insert policies
//! - The [`Scraper`] facade wiring the structured and article pipelines

mod orchestrator;
mod policy;
mod scraper;


pub use orchestrator::{Pipeline, RunOutcome, RunStats};
pub use policy::{DedupHitPolicy, InsertMode, PipelineOptions};
pub use scraper::{validate_search, Scraper, ScraperBuilder};
