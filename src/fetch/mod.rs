//! Fetch stage: feed fetching, parsing and concurrent aggregation
//!
//! This module contains:
//! - `HttpFeedFetcher`: fetches and parses one source, failures as data
//! - `Aggregator`: bounded fan-out across all sources
//! - Feed parsing helpers (feed-rs for documents, scraper for HTML bodies)

mod aggregator;
mod fetcher;
mod parser;
mod types;

pub use aggregator::{AggregateReport, Aggregator};
pub use fetcher::{build_http_client, HttpFeedFetcher, SourceFetcher};
pub use parser::{html_to_text, matches_query, parse_feed};
pub use types::{FailedSource, FailureKind, FetchError, FetchOutcome, RawItem};
