//! Last line of defense between the reasoning loop and the customer's
//! inbox. Whatever the loop produced, `sanitize` yields reply text that
//! is safe to send: non-empty, free of loop internals, and honest about
//! whether the model actually answered.

use std::sync::LazyLock;

use regex::Regex;

use crate::agent::executor::{AbortReason, LoopOutcome};

static ANSWER_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)final\s+answer")
        .unwrap_or_else(|err| panic!("invalid answer marker pattern: {err}"))
});

/// Reply sent when no usable answer could be produced.
pub const FALLBACK_REPLY: &str = "Thanks for reaching out. We received your message and a \
     member of our team will get back to you shortly.";

/// The reply text chosen for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentResult {
    pub final_text: String,
    /// True when the text did not come from a well-formed `Final
    /// Answer`, whether recovered from malformed output or replaced by
    /// [`FALLBACK_REPLY`].
    pub used_fallback: bool,
}

/// Converts a loop outcome into deliverable reply text. Total: every
/// outcome maps to a non-empty reply, and no branch can fail.
pub fn sanitize(outcome: LoopOutcome) -> AgentResult {
    match outcome {
        LoopOutcome::Done(answer) => {
            let trimmed = answer.trim();
            if trimmed.is_empty() {
                tracing::warn!("Final answer was empty, substituting fallback reply");
                fallback()
            } else {
                AgentResult {
                    final_text: trimmed.to_string(),
                    used_fallback: false,
                }
            }
        }
        LoopOutcome::Aborted(AbortReason::Unparseable(raw)) => match recover_partial_answer(&raw) {
            Some(recovered) => {
                tracing::warn!("Recovered reply text from malformed model output");
                AgentResult {
                    final_text: recovered,
                    used_fallback: true,
                }
            }
            None => {
                tracing::warn!("Malformed model output held no usable reply");
                fallback()
            }
        },
        LoopOutcome::Aborted(reason) => {
            tracing::warn!(?reason, "Loop aborted, substituting fallback reply");
            fallback()
        }
    }
}

/// Looks for an attempted answer inside text that missed the reply
/// grammar. Matches the answer marker case-insensitively and returns
/// everything after it, with marker punctuation stripped.
///
/// The match runs on the raw text directly, so the offsets stay valid
/// whatever characters surround the marker. Case folding through a
/// lowered copy would shift byte offsets on characters like 'İ'.
pub fn recover_partial_answer(raw: &str) -> Option<String> {
    let marker = ANSWER_MARKER_RE.find(raw)?;
    let cleaned = raw[marker.end()..]
        .trim_start_matches([':', '-', ' ', '\t', '\n', '\r'])
        .trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn fallback() -> AgentResult {
    AgentResult {
        final_text: FALLBACK_REPLY.to_string(),
        used_fallback: true,
    }
}
