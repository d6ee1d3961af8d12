//! HTTP mail transport speaking the SendGrid v3 `mail/send` protocol

use crate::delivery::types::{DeliveryError, DeliveryReceipt, EmailMessage, MailTransport};
use crate::summarize::parse_retry_after;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct SendRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 2],
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    mime: &'a str,
    value: &'a str,
}

/// Sends digests through a SendGrid-compatible HTTP API
#[derive(Debug, Clone)]
pub struct HttpMailTransport {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpMailTransport {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }

    /// Builds a transport with its own client and request timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(client, endpoint, api_key))
    }
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, DeliveryError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| DeliveryError::Auth("no API key configured".to_string()))?;

        // text/plain must precede text/html in the content list
        let body = SendRequest {
            personalizations: [Personalization {
                to: message
                    .to
                    .iter()
                    .map(|email| Address {
                        email: email.as_str(),
                    })
                    .collect(),
            }],
            from: Address {
                email: &message.from,
            },
            subject: &message.subject,
            content: [
                Content {
                    mime: "text/plain",
                    value: &message.text_body,
                },
                Content {
                    mime: "text/html",
                    value: &message.html_body,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let message_id = response
                .headers()
                .get("x-message-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            return Ok(DeliveryReceipt { message_id });
        }

        let retry_after = parse_retry_after(response.headers());
        let text = response.text().await.unwrap_or_default();
        Err(classify_status(status, retry_after, text))
    }
}

fn classify_status(
    status: StatusCode,
    retry_after: Option<Duration>,
    text: String,
) -> DeliveryError {
    let message: String = text.chars().take(200).collect();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DeliveryError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => DeliveryError::RateLimited { retry_after },
        s if s.is_server_error() => {
            DeliveryError::Network(format!("HTTP {}: {}", s.as_u16(), message))
        }
        s => DeliveryError::Rejected {
            status: s.as_u16(),
            message,
        },
    }
}
