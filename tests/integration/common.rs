//! Shared fixtures for the integration tests

use async_trait::async_trait;
use feed_digest::config::{FeedEntry, SummarizerConfig};
use feed_digest::delivery::{DeliveryClient, HttpMailTransport, MailTransport};
use feed_digest::fetch::{Aggregator, HttpFeedFetcher};
use feed_digest::pipeline::{Orchestrator, OrchestratorSettings};
use feed_digest::policy::RetryPolicy;
use feed_digest::sources::{ConfigRegistry, SourceRegistry};
use feed_digest::summarize::{ProviderError, Summarizer, SummaryProvider, SummaryRequest};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One `<item>` of a test RSS feed: (title, link, description)
pub type Entry<'a> = (&'a str, &'a str, &'a str);

/// Builds an RSS 2.0 document from entries
pub fn rss(entries: &[Entry]) -> String {
    let items: String = entries
        .iter()
        .map(|(title, link, description)| {
            format!(
                "<item><title>{}</title><link>{}</link><description>{}</description></item>",
                title, link, description
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Test</title>{}</channel></rss>"#,
        items
    )
}

/// Serves `body` as a feed at `route`
pub async fn mount_feed(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Serves a feed that answers only after `delay`
pub async fn mount_slow_feed(server: &MockServer, route: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(rss(&[]))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

pub fn feed(server: &MockServer, route: &str, name: &str, category: &str) -> FeedEntry {
    FeedEntry {
        url: format!("{}{}", server.uri(), route),
        name: name.to_string(),
        category: category.to_string(),
        enabled: true,
        keywords: Vec::new(),
    }
}

/// Summarization provider replaying a script, then repeating its last entry
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    last: Result<String, ProviderError>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        let last = script.last().cloned().unwrap_or_else(|| Ok("ok".to_string()));
        Arc::new(Self {
            script: Mutex::new(script.into()),
            last,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(response: Result<String, ProviderError>) -> Arc<Self> {
        Self::new(vec![response])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummaryProvider for ScriptedProvider {
    async fn summarize(&self, _request: &SummaryRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.last.clone())
    }
}

/// Summarizer settings with millisecond delays
pub fn fast_summarizer_config() -> SummarizerConfig {
    SummarizerConfig {
        max_concurrent: 3,
        max_retries: 3,
        base_delay_ms: 1,
        max_delay_ms: 5,
        rate_limit_pause_ms: 10,
        ..SummarizerConfig::default()
    }
}

pub fn fast_retry_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries, Duration::from_millis(1), Duration::from_millis(5))
}

pub fn settings() -> OrchestratorSettings {
    OrchestratorSettings {
        title: "Integration Digest".to_string(),
        send_empty_digest: true,
        max_items: 15,
        run_deadline: Duration::from_secs(30),
        from: Some("digest@example.com".to_string()),
        to: vec!["reader@example.com".to_string()],
        config_hash: None,
    }
}

/// Mounts an accepting mail endpoint and returns a transport pointing at it
pub async fn accepting_mail(server: &MockServer) -> Arc<dyn MailTransport> {
    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .respond_with(ResponseTemplate::new(202).insert_header("x-message-id", "msg-1"))
        .mount(server)
        .await;
    mail_transport(server)
}

pub fn mail_transport(server: &MockServer) -> Arc<dyn MailTransport> {
    Arc::new(HttpMailTransport::new(
        reqwest::Client::new(),
        format!("{}/v3/mail/send", server.uri()),
        Some("sg-test".to_string()),
    ))
}

/// Wires an orchestrator with real HTTP fetching and delivery
pub struct Harness {
    pub feeds: Vec<FeedEntry>,
    pub provider: Arc<dyn SummaryProvider>,
    pub summarizer_config: SummarizerConfig,
    pub transport: Arc<dyn MailTransport>,
    pub delivery_retries: u32,
    pub fetch_timeout: Duration,
    pub settings: OrchestratorSettings,
}

impl Harness {
    pub fn new(
        feeds: Vec<FeedEntry>,
        provider: Arc<dyn SummaryProvider>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            feeds,
            provider,
            summarizer_config: fast_summarizer_config(),
            transport,
            delivery_retries: 3,
            fetch_timeout: Duration::from_millis(500),
            settings: settings(),
        }
    }

    pub fn build(self) -> Orchestrator {
        let registry: Arc<dyn SourceRegistry> = Arc::new(ConfigRegistry::new(self.feeds));
        let fetcher = HttpFeedFetcher::new(
            reqwest::Client::new(),
            self.fetch_timeout,
            10,
            fast_retry_policy(1),
        );
        Orchestrator::new(
            registry,
            Aggregator::new(Arc::new(fetcher), 10),
            Summarizer::new(self.provider, self.summarizer_config),
            DeliveryClient::new(self.transport, fast_retry_policy(self.delivery_retries)),
            self.settings,
        )
    }
}
