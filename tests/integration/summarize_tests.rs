//! Summarization resilience observed through whole runs

use crate::common::{accepting_mail, feed, mount_feed, rss, Harness, ScriptedProvider};
use feed_digest::summarize::ProviderError;
use std::time::Duration;
use wiremock::MockServer;

async fn one_item_feed(server: &MockServer) {
    mount_feed(
        server,
        "/feed",
        rss(&[("Launch notes", "https://news.example/launch", "The release adds streaming.")]),
    )
    .await;
}

#[tokio::test]
async fn test_rate_limited_once_then_provider_text() {
    let feeds_server = MockServer::start().await;
    let mail_server = MockServer::start().await;
    one_item_feed(&feeds_server).await;

    let provider = ScriptedProvider::new(vec![
        Err(ProviderError::RateLimited {
            retry_after: Some(Duration::from_millis(20)),
        }),
        Ok("Streaming arrives in the new release.".to_string()),
    ]);
    let harness = Harness::new(
        vec![feed(&feeds_server, "/feed", "News", "General")],
        provider.clone(),
        accepting_mail(&mail_server).await,
    );

    let result = harness.build().run().await;

    assert!(result.is_success());
    assert_eq!(result.summary_retries, 1);
    assert_eq!(result.items_summarized_via_fallback, 0);
    assert_eq!(provider.calls(), 2);

    let requests = mail_server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("Streaming arrives in the new release."));
}

#[tokio::test]
async fn test_provider_always_down_uses_fallback_summaries() {
    let feeds_server = MockServer::start().await;
    let mail_server = MockServer::start().await;
    one_item_feed(&feeds_server).await;

    let provider = ScriptedProvider::always(Err(ProviderError::Network("refused".to_string())));
    let harness = Harness::new(
        vec![feed(&feeds_server, "/feed", "News", "General")],
        provider.clone(),
        accepting_mail(&mail_server).await,
    );

    let result = harness.build().run().await;

    assert!(result.is_success());
    assert!(result.degraded);
    assert_eq!(result.items_summarized_via_fallback, 1);
    assert_eq!(result.summary_retries, 3);
    assert_eq!(provider.calls(), 4);

    let requests = mail_server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("The release adds streaming."));
}

#[tokio::test]
async fn test_auth_failure_falls_back_without_retry() {
    let feeds_server = MockServer::start().await;
    let mail_server = MockServer::start().await;
    one_item_feed(&feeds_server).await;

    let provider =
        ScriptedProvider::always(Err(ProviderError::Authentication("bad key".to_string())));
    let harness = Harness::new(
        vec![feed(&feeds_server, "/feed", "News", "General")],
        provider.clone(),
        accepting_mail(&mail_server).await,
    );

    let result = harness.build().run().await;

    assert!(result.is_success());
    assert_eq!(result.items_summarized_via_fallback, 1);
    assert_eq!(result.summary_retries, 0);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_expired_deadline_marks_run_time_bounded() {
    let feeds_server = MockServer::start().await;
    let mail_server = MockServer::start().await;
    one_item_feed(&feeds_server).await;

    let mut harness = Harness::new(
        vec![feed(&feeds_server, "/feed", "News", "General")],
        ScriptedProvider::always(Ok("unused".to_string())),
        accepting_mail(&mail_server).await,
    );
    harness.settings.run_deadline = Duration::ZERO;

    let result = harness.build().run().await;

    assert!(result.is_success());
    assert!(result.time_bounded);
    assert_eq!(result.skipped_sources, vec!["News".to_string()]);
    assert_eq!(result.items_fetched, 0);
}
