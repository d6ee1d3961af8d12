use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// One outgoing digest email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub from: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// What the transport reports back for an accepted message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Provider-assigned message id, when the provider returns one
    pub message_id: Option<String>,
}

/// Errors returned by a mail transport
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    #[error("authentication with the mail provider failed: {0}")]
    Auth(String),

    #[error("mail provider rate limit (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("mail provider rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl DeliveryError {
    /// Only rate limits and network failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Network(_))
    }
}

/// Sends one email
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, DeliveryError>;
}
