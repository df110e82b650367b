use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::NotificationSink;
use crate::config::MailSettings;
use crate::error::DeliveryError;

/// SMTP sink. Every send is followed by `send_delay` to stay under the relay's rate limit.
pub struct EmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    send_delay: Duration,
}

impl EmailSender {
    pub fn from_settings(mail: &MailSettings) -> Result<Self, DeliveryError> {
        let creds = Credentials::new(mail.login.clone(), mail.pass.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&mail.smtp_host)?
            .port(mail.smtp_port)
            .credentials(creds)
            .build();

        let from: Mailbox = mail.login.parse()?;
        let to: Mailbox = mail.to.parse()?;

        Ok(Self {
            mailer,
            from,
            to,
            send_delay: mail.send_delay,
        })
    }

    async fn deliver(&self, subject: &str, body: &str) -> Result<(), DeliveryError> {
        let msg = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        self.mailer.send(msg).await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for EmailSender {
    async fn send(&self, subject: &str, body: &str) -> Result<(), DeliveryError> {
        let res = self.deliver(subject, body).await;
        tokio::time::sleep(self.send_delay).await;
        res
    }
}
