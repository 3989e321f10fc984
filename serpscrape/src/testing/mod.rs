//! Testing utilities.
//!
//! This module provides:
//! - A fetcher serving canned pages with per-URL call counters
//! - A result finder returning fixed results
//! - HTML fixtures for the search, field and article extractors

pub mod fixtures;
mod mocks;

pub use mocks::{MockFetcher, StaticResultFinder};
