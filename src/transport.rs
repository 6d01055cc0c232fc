//! Outbound mail transport, SMTP via lettre.
//!
//! Delivery is fire-once: the pipeline does not retry a failed send, it
//! logs the failure and ends the unit of work.

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::SmtpConfig;
use crate::error::TransportError;

/// Sends a finished reply to a recipient.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, to: &str, subject: &str, body: &str) -> Result<(), TransportError>;
}

/// SMTP transport using the configured relay.
#[derive(Clone)]
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), TransportError> {
        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());

        let transport = SmtpTransport::relay(&self.config.host)
            .map_err(|e| TransportError::SendFailed(format!("SMTP relay error: {e}")))?
            .port(self.config.port)
            .credentials(creds)
            .build();

        let email = Message::builder()
            .from(
                self.config
                    .from_address
                    .parse()
                    .map_err(|e| TransportError::InvalidAddress {
                        address: self.config.from_address.clone(),
                        reason: format!("{e}"),
                    })?,
            )
            .to(to.parse().map_err(|e| TransportError::InvalidAddress {
                address: to.to_string(),
                reason: format!("{e}"),
            })?)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| TransportError::BuildFailed(e.to_string()))?;

        transport
            .send(&email)
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;

        tracing::info!(to = %to, "Reply sent");
        Ok(())
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn deliver(&self, to: &str, subject: &str, body: &str) -> Result<(), TransportError> {
        let mailer = self.clone();
        let (to, subject, body) = (to.to_string(), subject.to_string(), body.to_string());
        // lettre's SmtpTransport is blocking; keep it off the runtime threads.
        tokio::task::spawn_blocking(move || mailer.send_email(&to, &subject, &body))
            .await
            .map_err(|e| TransportError::SendFailed(format!("send task panicked: {e}")))?
    }
}

/// Transport that only logs, used when no SMTP relay is configured.
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn deliver(&self, to: &str, subject: &str, body: &str) -> Result<(), TransportError> {
        tracing::info!(
            to = %to,
            subject = %subject,
            body_len = body.len(),
            "SMTP not configured, logging reply instead of sending"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_transport_always_succeeds() {
        let transport = LogTransport;
        assert!(
            transport
                .deliver("a@b.com", "RE:hi", "body")
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn smtp_mailer_rejects_invalid_recipient() {
        let mailer = SmtpMailer::new(SmtpConfig {
            host: "smtp.example.com".into(),
            port: 587,
            username: "user".into(),
            password: "pass".into(),
            from_address: "agent@example.com".into(),
        });
        let err = mailer.deliver("not-an-address", "RE:hi", "body").await;
        assert!(matches!(err, Err(TransportError::InvalidAddress { .. })));
    }
}
