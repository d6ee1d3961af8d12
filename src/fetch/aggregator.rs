//! Concurrent fan-out over all sources
//!
//! Every source is fetched on its own task, at most `max_concurrent` at a
//! time. Outcomes travel back to the collecting task through a `JoinSet` and
//! are reassembled in registry order, so the emitted item sequence does not
//! depend on which source finished first.

use crate::fetch::fetcher::SourceFetcher;
use crate::fetch::types::{FailedSource, FetchError, FetchOutcome, RawItem};
use crate::policy::RunDeadline;
use crate::sources::SourceDescriptor;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Everything the fetch stage hands to the rest of the run
#[derive(Debug, Clone, Default)]
pub struct AggregateReport {
    /// Items from all successful sources, registry order then feed order
    pub items: Vec<RawItem>,
    pub failed: Vec<FailedSource>,
    /// Display names of sources never started because the deadline passed
    pub skipped: Vec<String>,
    /// More than half of the sources failed
    pub degraded: bool,
}

impl AggregateReport {
    pub fn successful_sources(&self, total: usize) -> usize {
        total - self.failed.len() - self.skipped.len()
    }
}

/// Fetches many sources concurrently and tolerates partial failure
#[derive(Clone)]
pub struct Aggregator {
    fetcher: Arc<dyn SourceFetcher>,
    max_concurrent: usize,
}

impl Aggregator {
    pub fn new(fetcher: Arc<dyn SourceFetcher>, max_concurrent: usize) -> Self {
        Self {
            fetcher,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Fetches every source and collects items and failures
    ///
    /// No new fetch starts once `deadline` has passed; sources not yet
    /// started are reported in `skipped`. Fetches already running finish.
    pub async fn aggregate(
        &self,
        sources: &[SourceDescriptor],
        deadline: RunDeadline,
    ) -> AggregateReport {
        let limiter = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();
        let mut skipped = Vec::new();
        let mut started = 0;

        for (index, source) in sources.iter().enumerate() {
            let permit = match Arc::clone(&limiter).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            if deadline.is_expired() {
                tracing::warn!(
                    "Run deadline reached, skipping {} unfetched sources",
                    sources.len() - index
                );
                skipped.extend(sources[index..].iter().map(|s| s.display_name.clone()));
                break;
            }

            let fetcher = Arc::clone(&self.fetcher);
            let source = source.clone();
            tasks.spawn(async move {
                let outcome = fetcher.fetch(&source, deadline).await;
                drop(permit);
                (index, outcome)
            });
            started += 1;
        }

        let mut outcomes: Vec<Option<FetchOutcome>> = vec![None; started];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => tracing::error!("Fetch task ended abnormally: {}", e),
            }
        }

        let mut report = AggregateReport {
            skipped,
            ..Default::default()
        };

        for (source, outcome) in sources.iter().zip(outcomes) {
            let outcome = outcome.unwrap_or_else(|| {
                FetchOutcome::failed(FetchError::Network {
                    url: source.url.clone(),
                    status: None,
                    message: "fetch task aborted".to_string(),
                })
            });

            match outcome.failure {
                Some(error) => report.failed.push(FailedSource {
                    name: source.display_name.clone(),
                    url: source.url.clone(),
                    kind: error.kind(),
                    reason: error.to_string(),
                }),
                None => report.items.extend(outcome.items),
            }
        }

        report.degraded = report.failed.len() * 2 > sources.len();

        tracing::info!(
            "Fetched {} items from {}/{} sources ({} failed, {} skipped)",
            report.items.len(),
            report.successful_sources(sources.len()),
            sources.len(),
            report.failed.len(),
            report.skipped.len()
        );
        if report.degraded {
            tracing::warn!("More than half of the sources failed; continuing as a degraded run");
        }

        report
    }
}
