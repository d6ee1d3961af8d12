//! Run orchestration
//!
//! One call to [`Orchestrator::run`] walks a run through
//! `Start -> FetchingSources -> Deduplicating -> Summarizing -> Formatting ->
//! Delivering -> Done`. Fetch and summarization problems are absorbed into
//! counters; only the conditions listed in [`RunFailure`] end a run early.

use crate::config::Config;
use crate::dedup::{deduplicate, limit_newest, verify_unique_ids, DigestItem};
use crate::delivery::{
    DeliveryClient, DeliveryOutcome, EmailMessage, HttpMailTransport, MailTransport,
    PreviewTransport,
};
use crate::fetch::{Aggregator, FailedSource, HttpFeedFetcher};
use crate::output::{render_digest, DigestContext};
use crate::pipeline::run_result::{DeliveryStatus, RunFailure, RunResult};
use crate::policy::RunDeadline;
use crate::sources::{ConfigRegistry, SourceRegistry};
use crate::state::{RunStage, StageTracker};
use crate::storage::{JsonlArchive, RunStore};
use crate::summarize::{ChatCompletionsProvider, Summarizer};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Run-level settings the orchestrator needs beyond its collaborators
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub title: String,
    pub send_empty_digest: bool,
    pub max_items: usize,
    pub run_deadline: Duration,
    pub from: Option<String>,
    pub to: Vec<String>,
    pub config_hash: Option<String>,
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config, config_hash: Option<String>) -> Self {
        Self {
            title: config.digest.title.clone(),
            send_empty_digest: config.digest.send_empty_digest,
            max_items: config.digest.max_items,
            run_deadline: config.digest.run_deadline(),
            from: config.delivery.from.clone(),
            to: config.delivery.to.clone(),
            config_hash,
        }
    }
}

/// Sequences the pipeline stages for one run at a time
pub struct Orchestrator {
    registry: Arc<dyn SourceRegistry>,
    aggregator: Aggregator,
    summarizer: Summarizer,
    delivery: DeliveryClient,
    store: Option<Arc<dyn RunStore>>,
    settings: OrchestratorSettings,
}

/// Mutable bookkeeping for one run
struct RunState {
    tracker: StageTracker,
    items_fetched: usize,
    failed_sources: Vec<FailedSource>,
    skipped_sources: Vec<String>,
    items_deduplicated: usize,
    summary_retries: u32,
    degraded: bool,
    time_bounded: bool,
    delivery_status: DeliveryStatus,
    items: Vec<DigestItem>,
}

impl RunState {
    fn new() -> Self {
        Self {
            tracker: StageTracker::new(),
            items_fetched: 0,
            failed_sources: Vec::new(),
            skipped_sources: Vec::new(),
            items_deduplicated: 0,
            summary_retries: 0,
            degraded: false,
            time_bounded: false,
            delivery_status: DeliveryStatus::NotAttempted,
            items: Vec::new(),
        }
    }

    fn enter(&mut self, stage: RunStage) -> Result<(), RunFailure> {
        self.tracker
            .transition(stage)
            .map_err(|e| RunFailure::Internal(e.to_string()))?;
        tracing::info!("Stage: {}", stage);
        Ok(())
    }

    fn fallback_count(&self) -> usize {
        self.items.iter().filter(|i| i.summary_is_fallback).count()
    }
}

impl Orchestrator {
    pub fn new(
        registry: Arc<dyn SourceRegistry>,
        aggregator: Aggregator,
        summarizer: Summarizer,
        delivery: DeliveryClient,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            registry,
            aggregator,
            summarizer,
            delivery,
            store: None,
            settings,
        }
    }

    /// Attaches the persistence collaborator
    pub fn with_store(mut self, store: Arc<dyn RunStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Wires the HTTP implementations of every collaborator from `config`
    ///
    /// API keys are read from the environment variables the config names.
    /// With `dry_run` the digest is printed instead of sent.
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Ready to run
    /// * `Err(DigestError::Config)` - `config` does not pass validation
    /// * `Err(DigestError::Reqwest)` - An HTTP client could not be built
    pub fn from_config(
        config: &Config,
        config_hash: Option<String>,
        dry_run: bool,
    ) -> crate::Result<Self> {
        crate::config::validate(config)?;

        let registry = Arc::new(ConfigRegistry::from_config(config));

        let fetcher = HttpFeedFetcher::from_config(&config.fetch)?;
        let aggregator = Aggregator::new(Arc::new(fetcher), config.fetch.max_concurrent_fetches);

        let summarizer_client = reqwest::Client::builder()
            .timeout(config.summarizer.timeout())
            .build()?;
        let provider = ChatCompletionsProvider::new(
            summarizer_client,
            config.summarizer.endpoint.clone(),
            config.summarizer.model.clone(),
            secret_from_env(&config.summarizer.api_key_env),
            config.summarizer.temperature,
        );
        let summarizer = Summarizer::new(Arc::new(provider), config.summarizer.clone());

        let transport: Arc<dyn MailTransport> = if dry_run {
            Arc::new(PreviewTransport)
        } else {
            Arc::new(HttpMailTransport::with_timeout(
                config.delivery.endpoint.clone(),
                secret_from_env(&config.delivery.api_key_env),
                config.delivery.timeout(),
            )?)
        };
        let delivery = DeliveryClient::new(transport, config.delivery.retry_policy());

        let mut orchestrator = Self::new(
            registry,
            aggregator,
            summarizer,
            delivery,
            OrchestratorSettings::from_config(config, config_hash),
        );
        if let Some(path) = &config.archive.path {
            orchestrator = orchestrator.with_store(Arc::new(JsonlArchive::new(path)));
        }
        Ok(orchestrator)
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Executes one full run and reports it
    ///
    /// Never returns an error: a failed run is a `RunResult` whose
    /// `final_stage` is `Failed` and whose `failure` names the cause.
    pub async fn run(&self) -> RunResult {
        let started = Instant::now();
        let run_timestamp = Utc::now();
        let deadline = RunDeadline::after(self.settings.run_deadline);
        let mut state = RunState::new();

        tracing::info!("Starting digest run");
        let failure = match self.execute(&mut state, run_timestamp, deadline).await {
            Ok(()) => None,
            Err(failure) => {
                tracing::error!("Run failed: {}", failure);
                if let Err(e) = state.tracker.transition(RunStage::Failed) {
                    tracing::error!("{}", e);
                }
                Some(failure)
            }
        };

        let result = RunResult {
            run_id: run_id(run_timestamp),
            run_timestamp,
            config_hash: self.settings.config_hash.clone(),
            final_stage: state.tracker.current(),
            items_fetched: state.items_fetched,
            items_failed_sources: state.failed_sources.len(),
            items_deduplicated: state.items_deduplicated,
            items_in_digest: state.items.len(),
            items_summarized_via_fallback: state.fallback_count(),
            summary_retries: state.summary_retries,
            failed_sources: state.failed_sources,
            skipped_sources: state.skipped_sources,
            degraded: state.degraded,
            time_bounded: state.time_bounded,
            delivery_status: state.delivery_status,
            failure,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        tracing::info!("Run finished: {}", result.headline());

        if let Some(store) = &self.store {
            if let Err(e) = store.store(&result, &state.items).await {
                tracing::warn!("Failed to archive run {}: {}", result.run_id, e);
            }
        }

        result
    }

    async fn execute(
        &self,
        state: &mut RunState,
        run_timestamp: DateTime<Utc>,
        deadline: RunDeadline,
    ) -> Result<(), RunFailure> {
        let recipients = self.recipients()?;
        let sender = self
            .settings
            .from
            .clone()
            .filter(|from| !from.trim().is_empty())
            .ok_or(RunFailure::NoSender)?;

        let sources = self
            .registry
            .list_enabled_sources()
            .map_err(|e| RunFailure::Registry(e.to_string()))?;

        state.enter(RunStage::FetchingSources)?;
        let report = self.aggregator.aggregate(&sources, deadline).await;
        state.items_fetched = report.items.len();
        state.degraded = report.degraded;
        state.time_bounded = !report.skipped.is_empty();
        state.failed_sources = report.failed;
        state.skipped_sources = report.skipped;

        state.enter(RunStage::Deduplicating)?;
        let unique = deduplicate(report.items, &sources);
        verify_unique_ids(&unique).map_err(|e| RunFailure::Internal(e.to_string()))?;
        state.items_deduplicated = unique.len();
        let (selected, dropped) = limit_newest(unique, self.settings.max_items);
        tracing::info!(
            "{} unique items from {} fetched ({} over the digest limit)",
            state.items_deduplicated,
            state.items_fetched,
            dropped
        );

        if selected.is_empty() && !self.settings.send_empty_digest {
            return Err(RunFailure::NoContent);
        }

        state.enter(RunStage::Summarizing)?;
        let summarized = self.summarizer.summarize_all(selected, deadline).await;
        state.summary_retries = summarized.stats.retries;
        state.time_bounded |= summarized.time_bounded();
        state.items = summarized.items;
        if state.fallback_count() > 0 {
            state.degraded = true;
        }

        state.enter(RunStage::Formatting)?;
        let context = DigestContext {
            title: self.settings.title.clone(),
            generated_at: run_timestamp,
            failed_sources: state.failed_sources.clone(),
            fallback_count: state.fallback_count(),
            degraded: state.degraded,
            time_bounded: state.time_bounded,
        };
        let digest = render_digest(&state.items, &context);

        state.enter(RunStage::Delivering)?;
        let message = EmailMessage {
            to: recipients,
            from: sender,
            subject: digest.subject,
            html_body: digest.html,
            text_body: digest.text,
        };

        match self.delivery.deliver(&message).await {
            DeliveryOutcome::Delivered { attempts, receipt } => {
                state.delivery_status = DeliveryStatus::Delivered {
                    attempts,
                    message_id: receipt.message_id,
                };
            }
            DeliveryOutcome::Fatal { attempts, error } => {
                state.delivery_status = DeliveryStatus::Failed {
                    attempts,
                    error: error.to_string(),
                };
                return Err(RunFailure::DeliveryRejected {
                    attempts,
                    reason: error.to_string(),
                });
            }
            DeliveryOutcome::Exhausted { attempts, error } => {
                state.delivery_status = DeliveryStatus::Failed {
                    attempts,
                    error: error.to_string(),
                };
                return Err(RunFailure::DeliveryExhausted {
                    attempts,
                    reason: error.to_string(),
                });
            }
        }

        state.enter(RunStage::Done)
    }

    fn recipients(&self) -> Result<Vec<String>, RunFailure> {
        let recipients: Vec<String> = self
            .settings
            .to
            .iter()
            .map(|to| to.trim().to_string())
            .filter(|to| !to.is_empty())
            .collect();
        if recipients.is_empty() {
            return Err(RunFailure::NoRecipient);
        }
        Ok(recipients)
    }
}

fn secret_from_env(name: &str) -> Option<String> {
    let value = std::env::var(name).ok().filter(|v| !v.trim().is_empty());
    if value.is_none() {
        tracing::warn!("Environment variable {} is not set", name);
    }
    value
}

fn run_id(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y%m%dT%H%M%S%.3fZ").to_string()
}
