//! Digest delivery
//!
//! This module contains:
//! - `MailTransport`: the email provider seam
//! - `HttpMailTransport`: SendGrid-compatible HTTP transport
//! - `PreviewTransport`: prints the digest for dry runs
//! - `DeliveryClient`: recipient checks and the delivery retry policy

mod client;
mod preview;
mod sendgrid;
mod types;

pub use client::{DeliveryClient, DeliveryOutcome};
pub use preview::{format_preview, PreviewTransport};
pub use sendgrid::HttpMailTransport;
pub use types::{DeliveryError, DeliveryReceipt, EmailMessage, MailTransport};
