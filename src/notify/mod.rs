// src/notify/mod.rs
pub mod email;

use async_trait::async_trait;

use crate::error::DeliveryError;

pub use email::EmailSender;

pub const GREETING_SUBJECT: &str = "Hello from Projects Notifier";
pub const GREETING_BODY: &str = "Have a nice day";

/// Outbound notification channel. Implementations own any rate limiting.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<(), DeliveryError>;
}

/// Writes notifications to the log instead of delivering them (mail disabled).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, subject: &str, body: &str) -> Result<(), DeliveryError> {
        tracing::info!(target: "notify", %subject, %body, "notification (mail disabled)");
        Ok(())
    }
}
