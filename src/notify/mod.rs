// src/notify/mod.rs
//! Delivery of the rendered digest.

pub mod email;

use anyhow::Result;

pub use email::SmtpSender;

/// One finished digest, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingDigest {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Identifier the channel returned on success (SMTP server response for mail).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub id: String,
}

#[async_trait::async_trait]
pub trait DigestSender: Send + Sync {
    async fn send(&self, digest: &OutgoingDigest) -> Result<DeliveryReceipt>;
    fn name(&self) -> &'static str;
}
