use crate::config::validate_email;
use crate::delivery::types::{DeliveryError, DeliveryReceipt, EmailMessage, MailTransport};
use crate::policy::RetryPolicy;
use backoff::backoff::Backoff;
use std::sync::Arc;

/// Final result of delivering one message
#[derive(Debug, Clone)]
pub enum DeliveryOutcome {
    Delivered {
        attempts: u32,
        receipt: DeliveryReceipt,
    },
    /// A non-retryable error ended delivery
    Fatal { attempts: u32, error: DeliveryError },
    /// Every allowed attempt hit a retryable error
    Exhausted { attempts: u32, error: DeliveryError },
}

impl DeliveryOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Delivered { attempts, .. }
            | Self::Fatal { attempts, .. }
            | Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Delivers messages through a transport with its own retry policy
///
/// Rate limits and network failures are retried with exponential backoff
/// up to `max_retries` times. Authentication failures, invalid recipients
/// and rejections end delivery at once.
#[derive(Clone)]
pub struct DeliveryClient {
    transport: Arc<dyn MailTransport>,
    policy: RetryPolicy,
}

impl DeliveryClient {
    pub fn new(transport: Arc<dyn MailTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Sends `message`, retrying transient failures
    ///
    /// Recipients are checked locally first; a malformed address fails
    /// without contacting the provider.
    pub async fn deliver(&self, message: &EmailMessage) -> DeliveryOutcome {
        if message.to.is_empty() {
            return DeliveryOutcome::Fatal {
                attempts: 0,
                error: DeliveryError::InvalidRecipient("no recipients".to_string()),
            };
        }
        for recipient in &message.to {
            if let Err(e) = validate_email(recipient) {
                return DeliveryOutcome::Fatal {
                    attempts: 0,
                    error: DeliveryError::InvalidRecipient(e.to_string()),
                };
            }
        }

        let mut backoff = self.policy.backoff();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let error = match self.transport.send(message).await {
                Ok(receipt) => {
                    tracing::info!(
                        "Digest delivered to {} recipient(s) after {} attempt(s)",
                        message.to.len(),
                        attempts
                    );
                    return DeliveryOutcome::Delivered { attempts, receipt };
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                tracing::error!("Delivery failed permanently: {}", error);
                return DeliveryOutcome::Fatal { attempts, error };
            }
            if attempts >= self.policy.max_attempts() {
                tracing::error!("Delivery gave up after {} attempts: {}", attempts, error);
                return DeliveryOutcome::Exhausted { attempts, error };
            }

            let mut delay = backoff.next_backoff().unwrap_or(self.policy.max_delay);
            if let DeliveryError::RateLimited {
                retry_after: Some(retry_after),
            } = &error
            {
                delay = delay.max(*retry_after).min(self.policy.max_delay);
            }
            tracing::warn!(
                "Delivery attempt {} failed ({}), retrying in {:?}",
                attempts,
                error,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct ScriptedTransport {
        script: Mutex<Vec<Result<DeliveryReceipt, DeliveryError>>>,
        attempts: Mutex<u32>,
    }

    impl ScriptedTransport {
        /// Responses are consumed front to back; the last one repeats
        fn new(script: Vec<Result<DeliveryReceipt, DeliveryError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script),
                attempts: Mutex::new(0),
            })
        }

        fn attempts(&self) -> u32 {
            *self.attempts.lock().unwrap()
        }
    }

    #[async_trait]
    impl MailTransport for ScriptedTransport {
        async fn send(&self, _message: &EmailMessage) -> Result<DeliveryReceipt, DeliveryError> {
            *self.attempts.lock().unwrap() += 1;
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.remove(0)
            } else {
                script[0].clone()
            }
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(5))
    }

    fn message(to: &str) -> EmailMessage {
        EmailMessage {
            to: vec![to.to_string()],
            from: "digest@example.com".to_string(),
            subject: "Digest".to_string(),
            html_body: "<p>x</p>".to_string(),
            text_body: "x".to_string(),
        }
    }

    #[tokio::test]
    async fn test_rate_limited_retries_exactly_max_then_fails() {
        let transport =
            ScriptedTransport::new(vec![Err(DeliveryError::RateLimited { retry_after: None })]);
        let client = DeliveryClient::new(transport.clone(), policy());

        let outcome = client.deliver(&message("reader@example.com")).await;

        assert!(matches!(outcome, DeliveryOutcome::Exhausted { attempts: 4, .. }));
        assert_eq!(transport.attempts(), 4);
    }

    #[tokio::test]
    async fn test_network_error_then_success() {
        let transport = ScriptedTransport::new(vec![
            Err(DeliveryError::Network("reset".to_string())),
            Ok(DeliveryReceipt {
                message_id: Some("m-1".to_string()),
            }),
        ]);
        let client = DeliveryClient::new(transport.clone(), policy());

        let outcome = client.deliver(&message("reader@example.com")).await;

        assert!(outcome.is_delivered());
        assert_eq!(outcome.attempts(), 2);
    }

    #[tokio::test]
    async fn test_auth_error_is_fatal_immediately() {
        let transport = ScriptedTransport::new(vec![Err(DeliveryError::Auth("bad".to_string()))]);
        let client = DeliveryClient::new(transport.clone(), policy());

        let outcome = client.deliver(&message("reader@example.com")).await;

        assert!(matches!(outcome, DeliveryOutcome::Fatal { attempts: 1, .. }));
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn test_invalid_recipient_never_reaches_transport() {
        let transport = ScriptedTransport::new(vec![Ok(DeliveryReceipt::default())]);
        let client = DeliveryClient::new(transport.clone(), policy());

        let outcome = client.deliver(&message("not-an-address")).await;

        assert!(matches!(
            outcome,
            DeliveryOutcome::Fatal {
                attempts: 0,
                error: DeliveryError::InvalidRecipient(_)
            }
        ));
        assert_eq!(transport.attempts(), 0);
    }
}
