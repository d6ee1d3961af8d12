//! Delivery retry policy against a mock mail provider

use crate::common::{feed, mail_transport, mount_feed, rss, Harness, ScriptedProvider};
use feed_digest::pipeline::{DeliveryStatus, RunFailure};
use feed_digest::state::RunStage;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn harness(feeds_server: &MockServer, mail_server: &MockServer) -> Harness {
    mount_feed(
        feeds_server,
        "/feed",
        rss(&[("Post", "https://news.example/post", "body")]),
    )
    .await;
    Harness::new(
        vec![feed(feeds_server, "/feed", "News", "General")],
        ScriptedProvider::always(Ok("Summary.".to_string())),
        mail_transport(mail_server),
    )
}

#[tokio::test]
async fn test_rate_limited_delivery_retries_exactly_max_then_fails() {
    let feeds_server = MockServer::start().await;
    let mail_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .respond_with(ResponseTemplate::new(429))
        .expect(4)
        .mount(&mail_server)
        .await;

    let result = harness(&feeds_server, &mail_server).await.build().run().await;

    assert_eq!(result.final_stage, RunStage::Failed);
    assert!(matches!(
        result.failure,
        Some(RunFailure::DeliveryExhausted { attempts: 4, .. })
    ));
    assert!(matches!(
        result.delivery_status,
        DeliveryStatus::Failed { attempts: 4, .. }
    ));
}

#[tokio::test]
async fn test_server_error_then_accepted() {
    let feeds_server = MockServer::start().await;
    let mail_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mail_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202).insert_header("x-message-id", "m-9"))
        .mount(&mail_server)
        .await;

    let result = harness(&feeds_server, &mail_server).await.build().run().await;

    assert!(result.is_success());
    assert_eq!(
        result.delivery_status,
        DeliveryStatus::Delivered {
            attempts: 2,
            message_id: Some("m-9".to_string())
        }
    );
}

#[tokio::test]
async fn test_auth_rejection_fails_after_one_attempt() {
    let feeds_server = MockServer::start().await;
    let mail_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mail_server)
        .await;

    let result = harness(&feeds_server, &mail_server).await.build().run().await;

    assert_eq!(result.final_stage, RunStage::Failed);
    assert!(matches!(
        result.failure,
        Some(RunFailure::DeliveryRejected { attempts: 1, .. })
    ));
}

#[tokio::test]
async fn test_malformed_recipient_never_contacts_provider() {
    let feeds_server = MockServer::start().await;
    let mail_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&mail_server)
        .await;

    let mut harness = harness(&feeds_server, &mail_server).await;
    harness.settings.to = vec!["not-an-address".to_string()];

    let result = harness.build().run().await;

    assert_eq!(result.final_stage, RunStage::Failed);
    assert!(matches!(
        result.failure,
        Some(RunFailure::DeliveryRejected { attempts: 0, .. })
    ));
}
