//! Concurrent summarization with retry, shared rate-limit pause and fallback
//!
//! Per-item policy:
//!
//! | Condition | Action |
//! |-----------|--------|
//! | Cached prompt | Reuse cached summary, no call |
//! | Success | Bound to the word limit, cache |
//! | Rate limited | Pause every call (Retry-After or configured pause), retry |
//! | Timeout, network, 5xx | Retry with exponential backoff |
//! | Invalid request, auth, malformed | Fallback at once |
//! | Retries exhausted | Fallback |
//! | Deadline passed before an attempt | Fallback, run is time-bounded |

use crate::config::SummarizerConfig;
use crate::dedup::DigestItem;
use crate::policy::RunDeadline;
use crate::summarize::cache::{cache_key, SummaryCache};
use crate::summarize::provider::{ProviderError, SummaryProvider, SummaryRequest};
use crate::summarize::rate_limit::RateLimitGate;
use crate::summarize::text::{build_prompt, fallback_summary, truncate_words};
use backoff::backoff::Backoff;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Why an item ended up with the fallback summary
#[derive(Debug, Clone)]
pub enum FallbackReason {
    /// Non-transient provider failure; not retried
    Fatal(ProviderError),
    /// Transient failures on every attempt
    Exhausted(ProviderError),
    /// The deadline passed between attempts
    Deadline,
    /// The deadline passed before the item was started
    NotStarted,
    /// The summarization task ended without a result
    Aborted,
}

/// How one item got its summary
#[derive(Debug, Clone)]
pub enum ItemOutcome {
    Provider { retries: u32 },
    Cached,
    Fallback { retries: u32, reason: FallbackReason },
}

/// Counters for one summarization stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryStats {
    pub via_provider: usize,
    pub via_cache: usize,
    pub via_fallback: usize,
    /// Retries across all items (attempts beyond the first)
    pub retries: u32,
    /// Items that fell back on a non-transient provider error
    pub fatal_failures: usize,
    /// Items cut short or never started because of the deadline
    pub deadline_fallbacks: usize,
}

/// Summarized items plus stage counters
#[derive(Debug, Clone)]
pub struct SummarizeReport {
    /// Items in input order, each with a summary
    pub items: Vec<DigestItem>,
    pub stats: SummaryStats,
}

impl SummarizeReport {
    pub fn time_bounded(&self) -> bool {
        self.stats.deadline_fallbacks > 0
    }
}

/// Summarizes digest items through a provider
///
/// Clones share the provider, the rate-limit gate and the summary cache, so
/// one summarizer kept across scheduled runs reuses earlier summaries.
#[derive(Clone)]
pub struct Summarizer {
    provider: Arc<dyn SummaryProvider>,
    settings: Arc<SummarizerConfig>,
    gate: Arc<RateLimitGate>,
    cache: Arc<Mutex<SummaryCache>>,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn SummaryProvider>, settings: SummarizerConfig) -> Self {
        let cache = SummaryCache::new(settings.cache_capacity);
        Self {
            provider,
            settings: Arc::new(settings),
            gate: Arc::new(RateLimitGate::new()),
            cache: Arc::new(Mutex::new(cache)),
        }
    }

    /// Summarizes every item, at most `max-concurrent` calls at a time
    ///
    /// Always returns one summarized item per input item, in input order.
    pub async fn summarize_all(
        &self,
        items: Vec<DigestItem>,
        deadline: RunDeadline,
    ) -> SummarizeReport {
        let limiter = Arc::new(Semaphore::new(self.settings.max_concurrent.max(1)));
        let mut tasks = JoinSet::new();
        let mut results: Vec<Option<(DigestItem, ItemOutcome)>> = vec![None; items.len()];

        for (index, item) in items.iter().enumerate() {
            let permit = match Arc::clone(&limiter).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            if deadline.is_expired() {
                tracing::warn!(
                    "Run deadline reached, {} items get fallback summaries",
                    items.len() - index
                );
                for (slot, pending) in results[index..].iter_mut().zip(&items[index..]) {
                    *slot = Some(self.fallback(pending.clone(), 0, FallbackReason::NotStarted));
                }
                break;
            }

            let summarizer = self.clone();
            let item = item.clone();
            tasks.spawn(async move {
                let result = summarizer.summarize_one(item, deadline).await;
                drop(permit);
                (index, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => tracing::error!("Summarization task ended abnormally: {}", e),
            }
        }

        let mut stats = SummaryStats::default();
        let mut summarized = Vec::with_capacity(items.len());
        for (slot, original) in results.into_iter().zip(items) {
            let (item, outcome) =
                slot.unwrap_or_else(|| self.fallback(original, 0, FallbackReason::Aborted));
            record(&mut stats, &item, &outcome);
            summarized.push(item);
        }

        tracing::info!(
            "Summarized {} items ({} provider, {} cached, {} fallback, {} retries)",
            summarized.len(),
            stats.via_provider,
            stats.via_cache,
            stats.via_fallback,
            stats.retries
        );

        SummarizeReport {
            items: summarized,
            stats,
        }
    }

    /// Summarizes one item, retrying transient failures
    pub async fn summarize_one(
        &self,
        mut item: DigestItem,
        deadline: RunDeadline,
    ) -> (DigestItem, ItemOutcome) {
        let settings = &self.settings;
        let prompt = build_prompt(&item, settings.max_input_chars, settings.max_summary_words);
        let key = cache_key(&prompt);

        if let Some(summary) = self.cached(&key) {
            item.summary = Some(summary);
            return (item, ItemOutcome::Cached);
        }

        let request = SummaryRequest {
            prompt,
            max_tokens: settings.max_tokens,
        };
        let policy = settings.retry_policy();
        let mut backoff = policy.backoff();
        let mut retries = 0;

        loop {
            self.gate.wait(&deadline).await;
            if deadline.is_expired() {
                return self.fallback(item, retries, FallbackReason::Deadline);
            }

            let result =
                match tokio::time::timeout(settings.timeout(), self.provider.summarize(&request))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout),
                };

            let error = match result {
                Ok(text) => {
                    let summary = truncate_words(&text, settings.max_summary_words);
                    if summary.is_empty() {
                        return self.fallback(
                            item,
                            retries,
                            FallbackReason::Fatal(ProviderError::Malformed(
                                "empty completion".to_string(),
                            )),
                        );
                    }
                    self.store(key, summary.clone());
                    item.summary = Some(summary);
                    return (item, ItemOutcome::Provider { retries });
                }
                Err(error) if !error.is_transient() => {
                    return self.fallback(item, retries, FallbackReason::Fatal(error));
                }
                Err(error) => error,
            };

            if let ProviderError::RateLimited { retry_after } = &error {
                let pause = retry_after.unwrap_or_else(|| settings.rate_limit_pause());
                tracing::warn!("Provider rate limited; pausing all summarization for {:?}", pause);
                self.gate.pause_for(pause);
            }

            if retries >= policy.max_retries {
                return self.fallback(item, retries, FallbackReason::Exhausted(error));
            }

            let delay = backoff.next_backoff().unwrap_or(policy.max_delay);
            tracing::debug!(
                "Summary attempt {} for '{}' failed ({}), retrying in {:?}",
                retries + 1,
                item.title,
                error,
                delay
            );
            tokio::time::sleep(delay.min(deadline.remaining())).await;
            retries += 1;
        }
    }

    fn fallback(
        &self,
        mut item: DigestItem,
        retries: u32,
        reason: FallbackReason,
    ) -> (DigestItem, ItemOutcome) {
        item.summary = Some(fallback_summary(
            &item,
            self.settings.fallback_chars,
            self.settings.max_summary_words,
        ));
        item.summary_is_fallback = true;
        (item, ItemOutcome::Fallback { retries, reason })
    }

    fn cached(&self, key: &str) -> Option<String> {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
    }

    fn store(&self, key: String, summary: String) {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, summary);
    }
}

fn record(stats: &mut SummaryStats, item: &DigestItem, outcome: &ItemOutcome) {
    match outcome {
        ItemOutcome::Provider { retries } => {
            stats.via_provider += 1;
            stats.retries += retries;
        }
        ItemOutcome::Cached => stats.via_cache += 1,
        ItemOutcome::Fallback { retries, reason } => {
            stats.via_fallback += 1;
            stats.retries += retries;
            match reason {
                FallbackReason::Fatal(error) => {
                    stats.fatal_failures += 1;
                    tracing::warn!("Summary for '{}' failed permanently: {}", item.title, error);
                }
                FallbackReason::Exhausted(error) => {
                    tracing::warn!("Summary for '{}' gave up after retries: {}", item.title, error);
                }
                FallbackReason::Deadline | FallbackReason::NotStarted => {
                    stats.deadline_fallbacks += 1;
                }
                FallbackReason::Aborted => {}
            }
        }
    }
}
