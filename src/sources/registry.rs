use crate::config::{Config, FeedEntry};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// One feed source as seen by a single run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub url: String,
    pub display_name: String,
    pub category: String,
    pub enabled: bool,
    /// Keyword queries; empty means every entry is kept
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl SourceDescriptor {
    pub fn new(
        url: impl Into<String>,
        display_name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            display_name: display_name.into(),
            category: category.into(),
            enabled: true,
            keywords: Vec::new(),
        }
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }
}

impl From<&FeedEntry> for SourceDescriptor {
    fn from(entry: &FeedEntry) -> Self {
        Self {
            url: entry.url.trim().to_string(),
            display_name: entry.name.trim().to_string(),
            category: entry.category.trim().to_string(),
            enabled: entry.enabled,
            keywords: entry.keywords.clone(),
        }
    }
}

/// Errors returned by a source registry; all of them abort the run at start
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Source registry unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid source '{name}': {reason}")]
    InvalidSource { name: String, reason: String },
}

/// Supplies the ordered list of enabled sources for a run
pub trait SourceRegistry: Send + Sync {
    /// Returns the enabled sources in registry order
    ///
    /// Registry order is significant: the deduplicator attributes merged
    /// items to the earliest source in this list.
    fn list_enabled_sources(&self) -> Result<Vec<SourceDescriptor>, RegistryError>;
}

/// Registry backed by the `[[feeds]]` table of the configuration
#[derive(Debug, Clone)]
pub struct ConfigRegistry {
    feeds: Vec<FeedEntry>,
}

impl ConfigRegistry {
    pub fn new(feeds: Vec<FeedEntry>) -> Self {
        Self { feeds }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.feeds.clone())
    }
}

impl SourceRegistry for ConfigRegistry {
    fn list_enabled_sources(&self) -> Result<Vec<SourceDescriptor>, RegistryError> {
        self.feeds
            .iter()
            .filter(|entry| entry.enabled)
            .map(|entry| {
                Url::parse(entry.url.trim()).map_err(|e| RegistryError::InvalidSource {
                    name: entry.name.clone(),
                    reason: e.to_string(),
                })?;
                Ok(SourceDescriptor::from(entry))
            })
            .collect()
    }
}
