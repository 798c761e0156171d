//! Transactional email delivery over an authenticated SMTP relay.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Message, SmtpTransport, Transport};
use std::time::Duration;
use tokio::task;
use tracing::error;

use crate::config::MailConfig;

/// Sends a two-part (plaintext + HTML) message to each recipient.
///
/// Implementations report success as a boolean and never propagate failures
/// to the caller: a lost email must not fail the account mutation that
/// triggered it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        plaintext_body: &str,
        html_body: &str,
    ) -> bool;
}

/// Notifier backed by a TLS SMTP relay. One connection and one send per
/// recipient; no retry, no batching.
pub struct SmtpNotifier {
    config: MailConfig,
}

impl SmtpNotifier {
    #[must_use]
    pub const fn new(config: MailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        plaintext_body: &str,
        html_body: &str,
    ) -> bool {
        if self.config.smtp_host.is_empty() {
            error!("SMTP relay host is not configured");
            return false;
        }
        if self.config.smtp_login.is_empty() {
            error!("SMTP relay login is not configured");
            return false;
        }
        if self.config.smtp_password.is_empty() {
            error!("SMTP relay password is not configured");
            return false;
        }

        let config = self.config.clone();
        let recipients = recipients.to_vec();
        let subject = subject.to_string();
        let plaintext_body = plaintext_body.to_string();
        let html_body = html_body.to_string();

        // The SMTP transport is blocking; keep it off the async runtime.
        let result = task::spawn_blocking(move || {
            deliver(&config, &recipients, &subject, &plaintext_body, &html_body)
        })
        .await;

        match result {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                error!("Failed to send email: {e}");
                false
            }
            Err(e) => {
                error!("Email delivery task panicked: {e}");
                false
            }
        }
    }
}

fn deliver(
    config: &MailConfig,
    recipients: &[String],
    subject: &str,
    plaintext_body: &str,
    html_body: &str,
) -> anyhow::Result<()> {
    let sender: Mailbox = config
        .sender_email
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid sender address: {e}"))?;

    let tls_parameters = TlsParameters::builder(config.smtp_host.clone())
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build TLS parameters: {e}"))?;

    for recipient in recipients {
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid recipient address {recipient}: {e}"))?;

        let message = Message::builder()
            .from(sender.clone())
            .to(to)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                plaintext_body.to_string(),
                html_body.to_string(),
            ))
            .map_err(|e| anyhow::anyhow!("Failed to build message: {e}"))?;

        // Implicit-TLS relay session, one per recipient.
        let mailer = SmtpTransport::relay(&config.smtp_host)
            .map_err(|e| anyhow::anyhow!("Failed to create SMTP transport: {e}"))?
            .credentials(Credentials::new(
                config.smtp_login.clone(),
                config.smtp_password.clone(),
            ))
            .port(config.smtp_port)
            .tls(Tls::Wrapper(tls_parameters.clone()))
            .timeout(Some(Duration::from_secs(config.timeout_seconds)))
            .build();

        mailer
            .send(&message)
            .map_err(|e| anyhow::anyhow!("Relay rejected send to {recipient}: {e}"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_relay_config_fails_closed() {
        let notifier = SmtpNotifier::new(MailConfig::default());
        let sent = notifier
            .send(
                &["user@example.com".to_string()],
                "subject",
                "plain",
                "<p>html</p>",
            )
            .await;
        assert!(!sent);
    }

    #[tokio::test]
    async fn missing_credentials_fail_closed() {
        let config = MailConfig {
            smtp_host: "smtp.example.com".to_string(),
            ..MailConfig::default()
        };
        let notifier = SmtpNotifier::new(config);
        let sent = notifier
            .send(&["user@example.com".to_string()], "s", "p", "h")
            .await;
        assert!(!sent);
    }
}
