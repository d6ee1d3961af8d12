//! Configuration module for feed-digest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing keys fall back to the defaults below.
//!
//! | Section | Purpose |
//! |---------|---------|
//! | `[digest]` | title, item cap, run deadline, empty-digest policy |
//! | `[fetch]` | fetch concurrency, per-source timeout, entries per source |
//! | `[summarizer]` | provider endpoint and model, retry and rate-limit policy |
//! | `[delivery]` | mail endpoint, addresses, retry policy |
//! | `[archive]` | optional JSON-lines run archive |
//! | `[[feeds]]` | the source list |
//!
//! # Example
//!
//! ```no_run
//! use feed_digest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("digest.toml")).unwrap();
//! println!("Fetching with concurrency {}", config.fetch.max_concurrent_fetches);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ArchiveConfig, Config, DeliveryConfig, DigestConfig, FeedEntry, FetchConfig,
    SummarizerConfig,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash, parse_config,
};
pub use validation::{validate, validate_email};
