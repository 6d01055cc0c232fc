//! Message normalizer: raw MIME bytes to a plain-text request.
//!
//! Tolerates multipart/alternative, HTML-only messages, and outright
//! malformed input. Parsing failure is never surfaced to the caller: the
//! body degrades to an empty string and the pipeline continues with just
//! sender and subject. No retries; parsing is deterministic, a second
//! attempt cannot change the outcome.

use mail_parser::MessageParser;

/// One inbound email as fetched: envelope plus raw MIME bytes.
///
/// Immutable once built; discarded after the reply attempt completes.
#[derive(Debug, Clone)]
pub struct InboundEmail {
    pub sender: String,
    pub subject: String,
    pub raw_body: Vec<u8>,
    pub message_id: String,
}

/// The normalized triple handed to prompt assembly.
///
/// `body` is always present; parse failure yields `""`, never an absent
/// field, so template rendering downstream cannot crash on a missing slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub sender: String,
    pub subject: String,
    pub body: String,
}

/// Normalize an inbound email into `{sender, subject, body}`.
pub fn normalize(email: &InboundEmail) -> NormalizedRequest {
    let body = extract_body(&email.raw_body);
    if body.is_empty() {
        tracing::warn!(
            message_id = %email.message_id,
            "No readable body extracted, continuing with empty body"
        );
    }

    NormalizedRequest {
        sender: email.sender.clone(),
        subject: email.subject.clone(),
        body,
    }
}

/// Extract readable text from raw MIME bytes.
///
/// Preference order: plain-text part verbatim, then stripped HTML part,
/// then empty string.
fn extract_body(raw: &[u8]) -> String {
    let Some(parsed) = MessageParser::default().parse(raw) else {
        return String::new();
    };

    if let Some(text) = parsed.body_text(0) {
        return text.to_string();
    }
    if let Some(html) = parsed.body_html(0) {
        return strip_html(html.as_ref());
    }
    String::new()
}

/// Strip HTML tags from content (basic) and normalize whitespace.
pub fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result.split_whitespace().collect::<Vec<_>>().join(" ")
}
