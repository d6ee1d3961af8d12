//! feed-digest: a daily digest of RSS/Atom feeds
//!
//! This crate fetches many feeds concurrently, merges duplicate entries across
//! sources, summarizes each entry through an LLM provider, and delivers the
//! result as an HTML + plain-text email.
//!
//! The pipeline is driven by [`pipeline::Orchestrator`], one run at a time.

pub mod config;
pub mod dedup;
pub mod delivery;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod policy;
pub mod sources;
pub mod state;
pub mod storage;
pub mod summarize;
pub mod url;

use thiserror::Error;

/// Main error type for feed-digest operations
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source registry error: {0}")]
    Registry(#[from] sources::RegistryError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Duplicate item id after deduplication: {0}")]
    DuplicateItemId(String),

    #[error("Invalid stage transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunStage,
        to: state::RunStage,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for feed-digest operations
pub type Result<T> = std::result::Result<T, DigestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use dedup::DigestItem;
pub use fetch::RawItem;
pub use pipeline::{DeliveryStatus, Orchestrator, RunFailure, RunResult};
pub use sources::SourceDescriptor;
pub use state::RunStage;
pub use url::normalize_link;
