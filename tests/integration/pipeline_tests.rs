//! End-to-end runs over mock feeds and a mock mail provider

use crate::common::{
    accepting_mail, feed, mount_feed, mount_slow_feed, rss, Harness, ScriptedProvider,
};
use feed_digest::fetch::FailureKind;
use feed_digest::pipeline::{DeliveryStatus, RunFailure};
use feed_digest::state::RunStage;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_partial_failure_with_cross_source_duplicate() {
    let feeds_server = MockServer::start().await;
    let mail_server = MockServer::start().await;

    mount_feed(
        &feeds_server,
        "/a",
        rss(&[
            ("Shared story", "https://news.example/shared?utm_source=a", "short"),
            ("A only", "https://news.example/a-only", "alpha body"),
        ]),
    )
    .await;
    mount_feed(
        &feeds_server,
        "/b",
        rss(&[
            ("Shared story (B)", "https://www.news.example/shared/", "a longer body from B"),
            ("B only", "https://news.example/b-only", "beta body"),
        ]),
    )
    .await;
    mount_slow_feed(&feeds_server, "/c", Duration::from_secs(3)).await;

    let feeds = vec![
        feed(&feeds_server, "/a", "Source A", "Cloud"),
        feed(&feeds_server, "/b", "Source B", "AI"),
        feed(&feeds_server, "/c", "Source C", "AI"),
    ];
    let provider = ScriptedProvider::always(Ok("A concise summary.".to_string()));
    let mut harness = Harness::new(feeds, provider, accepting_mail(&mail_server).await);
    harness.fetch_timeout = Duration::from_millis(300);

    let result = harness.build().run().await;

    assert_eq!(result.final_stage, RunStage::Done);
    assert_eq!(result.items_fetched, 4);
    assert_eq!(result.items_failed_sources, 1);
    assert_eq!(result.items_deduplicated, 3);
    assert_eq!(result.items_in_digest, 3);
    assert_eq!(result.items_summarized_via_fallback, 0);
    assert_eq!(result.failed_sources[0].name, "Source C");
    assert_eq!(result.failed_sources[0].kind, FailureKind::Timeout);
    assert!(!result.degraded);

    let requests = mail_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let payload: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let text = payload["content"][0]["value"].as_str().unwrap();
    assert_eq!(text.matches("A concise summary.").count(), 3);
    assert!(text.contains("Source C"));
    // The merged story keeps B's longer entry but is attributed to Source A
    assert!(text.contains("* Shared story (B) (Source A)"));
}

#[tokio::test]
async fn test_empty_run_sends_no_updates_digest() {
    let feeds_server = MockServer::start().await;
    let mail_server = MockServer::start().await;
    mount_feed(&feeds_server, "/empty", rss(&[])).await;

    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .and(body_string_contains("No updates today"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&mail_server)
        .await;

    let provider = ScriptedProvider::always(Ok("unused".to_string()));
    let harness = Harness::new(
        vec![feed(&feeds_server, "/empty", "Quiet", "General")],
        provider.clone(),
        crate::common::mail_transport(&mail_server),
    );

    let result = harness.build().run().await;

    assert!(result.is_success());
    assert_eq!(result.items_in_digest, 0);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_empty_run_fails_when_empty_digests_disabled() {
    let feeds_server = MockServer::start().await;
    let mail_server = MockServer::start().await;
    mount_feed(&feeds_server, "/empty", rss(&[])).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&mail_server)
        .await;

    let provider = ScriptedProvider::always(Ok("unused".to_string()));
    let mut harness = Harness::new(
        vec![feed(&feeds_server, "/empty", "Quiet", "General")],
        provider,
        crate::common::mail_transport(&mail_server),
    );
    harness.settings.send_empty_digest = false;

    let result = harness.build().run().await;

    assert_eq!(result.final_stage, RunStage::Failed);
    assert_eq!(result.failure, Some(RunFailure::NoContent));
    assert_eq!(result.delivery_status, DeliveryStatus::NotAttempted);
}

#[tokio::test]
async fn test_no_recipient_fails_without_fetching() {
    let feeds_server = MockServer::start().await;
    let mail_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(rss(&[])))
        .expect(0)
        .mount(&feeds_server)
        .await;

    let mut harness = Harness::new(
        vec![feed(&feeds_server, "/a", "A", "General")],
        ScriptedProvider::always(Ok("unused".to_string())),
        accepting_mail(&mail_server).await,
    );
    harness.settings.to.clear();

    let result = harness.build().run().await;

    assert_eq!(result.final_stage, RunStage::Failed);
    assert_eq!(result.failure, Some(RunFailure::NoRecipient));
}

#[tokio::test]
async fn test_all_sources_failing_still_delivers_degraded_digest() {
    let feeds_server = MockServer::start().await;
    let mail_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&feeds_server)
        .await;

    let harness = Harness::new(
        vec![
            feed(&feeds_server, "/a", "A", "General"),
            feed(&feeds_server, "/b", "B", "General"),
        ],
        ScriptedProvider::always(Ok("unused".to_string())),
        accepting_mail(&mail_server).await,
    );

    let result = harness.build().run().await;

    assert!(result.is_success());
    assert!(result.degraded);
    assert_eq!(result.items_failed_sources, 2);
    assert_eq!(result.failed_sources[0].kind, FailureKind::Network);

    let requests = mail_server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("This digest is degraded"));
}

#[tokio::test]
async fn test_digest_limited_to_max_items() {
    let feeds_server = MockServer::start().await;
    let mail_server = MockServer::start().await;
    mount_feed(
        &feeds_server,
        "/many",
        rss(&[
            ("One", "https://news.example/1", "one"),
            ("Two", "https://news.example/2", "two"),
            ("Three", "https://news.example/3", "three"),
        ]),
    )
    .await;

    let mut harness = Harness::new(
        vec![feed(&feeds_server, "/many", "Many", "General")],
        ScriptedProvider::always(Ok("Summary.".to_string())),
        accepting_mail(&mail_server).await,
    );
    harness.settings.max_items = 2;

    let result = harness.build().run().await;

    assert_eq!(result.items_deduplicated, 3);
    assert_eq!(result.items_in_digest, 2);
}

#[tokio::test]
async fn test_source_recovering_after_server_error_counts_as_fetched() {
    let feeds_server = MockServer::start().await;
    let mail_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&feeds_server)
        .await;
    mount_feed(
        &feeds_server,
        "/flaky",
        rss(&[("Recovered", "https://news.example/recovered", "back online")]),
    )
    .await;

    let harness = Harness::new(
        vec![feed(&feeds_server, "/flaky", "Flaky", "General")],
        ScriptedProvider::always(Ok("Summary.".to_string())),
        accepting_mail(&mail_server).await,
    );

    let result = harness.build().run().await;

    assert!(result.is_success());
    assert_eq!(result.items_failed_sources, 0);
    assert_eq!(result.items_fetched, 1);
    assert!(result.failed_sources.is_empty());
}
