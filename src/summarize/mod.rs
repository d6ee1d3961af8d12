//! Summarization stage
//!
//! This module contains:
//! - `SummaryProvider`: the text-generation seam, with the chat-completions
//!   implementation in `ChatCompletionsProvider`
//! - `Summarizer`: bounded concurrency, retries, the shared rate-limit pause
//!   and fallback summaries
//! - `SummaryCache`: reuse of summaries for identical prompts

mod cache;
mod provider;
mod rate_limit;
mod summarizer;
pub mod text;

pub use cache::{cache_key, SummaryCache};
pub use provider::{
    parse_retry_after, ChatCompletionsProvider, ProviderError, SummaryProvider, SummaryRequest,
};
pub use rate_limit::RateLimitGate;
pub use summarizer::{FallbackReason, ItemOutcome, SummarizeReport, Summarizer, SummaryStats};
