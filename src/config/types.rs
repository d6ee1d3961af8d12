use crate::policy::RetryPolicy;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for feed-digest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub digest: DigestConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub feeds: Vec<FeedEntry>,
}

/// Run-level digest settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Title shown at the top of the digest and in the email subject
    pub title: String,

    /// Deliver a "no updates" digest when no items survive the run
    #[serde(rename = "send-empty-digest")]
    pub send_empty_digest: bool,

    /// Maximum number of items summarized and delivered per run
    #[serde(rename = "max-items")]
    pub max_items: usize,

    /// Wall-clock budget for one run (seconds)
    #[serde(rename = "run-deadline-secs")]
    pub run_deadline_secs: u64,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            title: "Daily Feed Digest".to_string(),
            send_empty_digest: true,
            max_items: 15,
            run_deadline_secs: 300,
        }
    }
}

impl DigestConfig {
    pub fn run_deadline(&self) -> Duration {
        Duration::from_secs(self.run_deadline_secs)
    }
}

/// Feed fetching configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum number of feeds fetched at the same time
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: usize,

    /// Per-source timeout covering request and body download (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Maximum entries taken from a single feed, newest first in feed order
    #[serde(rename = "max-items-per-source")]
    pub max_items_per_source: usize,

    /// User-Agent header sent with every feed request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Retries after the first request for timeouts, connect errors and 5xx
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,

    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 10,
            timeout_secs: 10,
            max_items_per_source: 3,
            user_agent: format!("feed-digest/{}", env!("CARGO_PKG_VERSION")),
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 4_000,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

/// LLM summarization configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Chat-completions endpoint of an OpenAI-compatible provider
    pub endpoint: String,

    pub model: String,

    /// Name of the environment variable holding the provider API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    pub temperature: f32,

    /// Maximum number of summarization calls in flight
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: usize,

    /// Retries after the first attempt for transient failures
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,

    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    /// Pause applied to all calls when the provider rate-limits without Retry-After (ms)
    #[serde(rename = "rate-limit-pause-ms")]
    pub rate_limit_pause_ms: u64,

    /// Per-call timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Upper bound on summary length in words
    #[serde(rename = "max-summary-words")]
    pub max_summary_words: usize,

    /// Number of body characters used for the fallback summary
    #[serde(rename = "fallback-chars")]
    pub fallback_chars: usize,

    /// Entry text is truncated to this many characters before prompting
    #[serde(rename = "max-input-chars")]
    pub max_input_chars: usize,

    /// Number of summaries kept in the in-process cache
    #[serde(rename = "cache-capacity")]
    pub cache_capacity: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: 300,
            temperature: 0.7,
            max_concurrent: 5,
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            rate_limit_pause_ms: 20_000,
            timeout_secs: 30,
            max_summary_words: 150,
            fallback_chars: 280,
            max_input_chars: 8_000,
            cache_capacity: 1_000,
        }
    }
}

impl SummarizerConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn rate_limit_pause(&self) -> Duration {
        Duration::from_millis(self.rate_limit_pause_ms)
    }
}

/// Email delivery configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Mail-send endpoint of a SendGrid-compatible provider
    pub endpoint: String,

    /// Name of the environment variable holding the provider API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Sender address; `EMAIL_FROM` overrides it
    pub from: Option<String>,

    /// Recipient addresses; `EMAIL_TO` (comma separated) overrides them
    pub to: Vec<String>,

    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,

    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.sendgrid.com/v3/mail/send".to_string(),
            api_key_env: "SENDGRID_API_KEY".to_string(),
            from: None,
            to: Vec::new(),
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            timeout_secs: 10,
        }
    }
}

impl DeliveryConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Run archive configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchiveConfig {
    /// JSON-lines file receiving one record per run
    pub path: Option<PathBuf>,
}

/// One configured feed
#[derive(Debug, Clone, Deserialize)]
pub struct FeedEntry {
    /// Feed URL (RSS or Atom)
    pub url: String,

    /// Display name used in the digest
    pub name: String,

    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Keep only entries matching at least one of these queries
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_category() -> String {
    "General".to_string()
}

fn default_enabled() -> bool {
    true
}
