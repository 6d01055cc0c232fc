//! Inbound email events: the envelope-level notification that a new
//! message arrived, independent of its stored body.
//!
//! The spool poller builds one `EmailEvent` per new raw message by reading
//! only the headers. The pipeline later fetches the full body from the
//! store; if that fetch fails, the event still carries enough (sender,
//! subject) to attempt a reply.

use chrono::{DateTime, Utc};
use mail_parser::MessageParser;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope of one inbound email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailEvent {
    /// Message-ID header, or a generated id when the header is absent.
    pub message_id: String,
    /// Sender address.
    pub sender: String,
    /// Subject line ("(no subject)" when absent).
    pub subject: String,
    /// When the event was observed.
    pub received_at: DateTime<Utc>,
}

impl EmailEvent {
    /// Build an event from raw MIME bytes, reading headers only.
    ///
    /// Returns `None` when no sender address can be determined; a message
    /// nobody can be replied to is dropped at the envelope stage.
    pub fn from_raw(raw: &[u8]) -> Option<Self> {
        let parsed = MessageParser::default().parse(raw)?;

        let sender = parsed
            .from()
            .and_then(|addr| addr.first())
            .and_then(|a| a.address())
            .map(|s| s.to_string())?;

        let subject = parsed.subject().unwrap_or("(no subject)").to_string();
        let message_id = parsed
            .message_id()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("gen-{}", Uuid::new_v4()));

        Some(Self {
            message_id,
            sender,
            subject,
            received_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "From: Alice <a@b.com>\r\n\
        To: support@example.com\r\n\
        Subject: Order #123 status?\r\n\
        Message-ID: <m1@b.com>\r\n\
        \r\n\
        Where is my order?\r\n";

    #[test]
    fn event_from_raw_reads_envelope() {
        let event = EmailEvent::from_raw(RAW.as_bytes()).unwrap();
        assert_eq!(event.message_id, "m1@b.com");
        assert_eq!(event.sender, "a@b.com");
        assert_eq!(event.subject, "Order #123 status?");
    }

    #[test]
    fn event_without_message_id_generates_one() {
        let raw = "From: a@b.com\r\nSubject: Hi\r\n\r\nBody\r\n";
        let event = EmailEvent::from_raw(raw.as_bytes()).unwrap();
        assert!(event.message_id.starts_with("gen-"));
    }

    #[test]
    fn event_without_subject_uses_placeholder() {
        let raw = "From: a@b.com\r\n\r\nBody\r\n";
        let event = EmailEvent::from_raw(raw.as_bytes()).unwrap();
        assert_eq!(event.subject, "(no subject)");
    }

    #[test]
    fn event_without_sender_is_dropped() {
        let raw = "Subject: orphan\r\n\r\nBody\r\n";
        assert!(EmailEvent::from_raw(raw.as_bytes()).is_none());
    }
}
