//! Integration tests for the digest pipeline
//!
//! Feeds and the mail provider are served by wiremock; the summarization
//! provider is an in-memory fake so each test controls its failures.

mod common;
mod delivery_tests;
mod pipeline_tests;
mod summarize_tests;
