use crate::delivery::types::{DeliveryError, DeliveryReceipt, EmailMessage, MailTransport};
use async_trait::async_trait;

/// Transport that prints the digest instead of sending it
///
/// Used for dry runs; always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewTransport;

#[async_trait]
impl MailTransport for PreviewTransport {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, DeliveryError> {
        println!("{}", format_preview(message));
        tracing::info!("Dry run: digest printed instead of sent");
        Ok(DeliveryReceipt::default())
    }
}

/// Renders a message the way the dry run prints it
pub fn format_preview(message: &EmailMessage) -> String {
    format!(
        "From: {}\nTo: {}\nSubject: {}\n\n{}",
        message.from,
        message.to.join(", "),
        message.subject,
        message.text_body
    )
}
