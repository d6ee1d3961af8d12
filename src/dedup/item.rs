use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A unique entry of one run's digest
///
/// Created by the deduplicator, given a summary by the summarizer and then
/// rendered by the formatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestItem {
    /// Stable identity derived from the normalized link (or title + source)
    pub id: String,
    pub source_name: String,
    pub source_url: String,
    pub category: String,
    pub title: String,
    pub link: Option<String>,
    pub summary: Option<String>,
    /// The summary was produced locally instead of by the provider
    #[serde(default)]
    pub summary_is_fallback: bool,
    pub published_at: Option<DateTime<Utc>>,
    /// Plain-text body used for prompting and for the fallback summary
    #[serde(skip)]
    pub body: String,
}

impl DigestItem {
    pub fn summary_text(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }
}
