//! Parser for the model's structured reply grammar.
//!
//! Each completion is expected to be either a tool invocation
//! (`Action:` / `Action Input:`) or a terminal `Final Answer:`. The
//! parser is tolerant of whitespace and numbering quirks but never
//! guesses: text matching neither shape is reported as unparseable and
//! the caller decides what to do with the raw string.

use std::sync::LazyLock;

use regex::Regex;

const FINAL_ANSWER_MARKER: &str = "Final Answer:";

static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Tool name is the non-greedy group so it stops at the first
    // `Action Input`; the input runs to end of text.
    Regex::new(r"(?s)Action\s*\d*\s*:\s*(.*?)\s*Action\s*\d*\s*Input\s*\d*\s*:\s*(.*)")
        .unwrap_or_else(|err| panic!("invalid action pattern: {err}"))
});

/// What one model completion told the loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Invoke the named tool with the given input.
    Action {
        thought: String,
        tool: String,
        input: String,
    },
    /// Terminate the loop with this reply text.
    FinalAnswer(String),
    /// Neither shape matched; carries the raw completion.
    Unparseable(String),
}

/// Classifies one raw model completion.
///
/// When a completion somehow contains both an action block and a final
/// answer marker, whichever occurs later in the text wins: models that
/// run past an action usually mean the conclusion they reached after it.
pub fn parse_directive(raw: &str) -> Directive {
    let action = ACTION_RE.captures(raw);
    let final_at = raw.find(FINAL_ANSWER_MARKER);

    match (&action, final_at) {
        (Some(captures), Some(marker_at)) => {
            let action_at = captures
                .get(0)
                .map(|whole| whole.start())
                .unwrap_or_default();
            if marker_at > action_at {
                final_answer(raw, marker_at)
            } else {
                action_directive(raw, captures)
            }
        }
        (Some(captures), None) => action_directive(raw, captures),
        (None, Some(marker_at)) => final_answer(raw, marker_at),
        (None, None) => Directive::Unparseable(raw.to_string()),
    }
}

fn final_answer(raw: &str, marker_at: usize) -> Directive {
    let answer = raw[marker_at + FINAL_ANSWER_MARKER.len()..].trim();
    Directive::FinalAnswer(answer.to_string())
}

fn action_directive(raw: &str, captures: &regex::Captures<'_>) -> Directive {
    let whole_at = captures
        .get(0)
        .map(|whole| whole.start())
        .unwrap_or_default();
    let thought = strip_thought_prefix(raw[..whole_at].trim());
    let tool = captures
        .get(1)
        .map(|m| m.as_str().trim())
        .unwrap_or_default();
    let input = captures
        .get(2)
        .map(|m| strip_matching_quotes(m.as_str().trim()))
        .unwrap_or_default();
    Directive::Action {
        thought: thought.to_string(),
        tool: tool.to_string(),
        input: input.to_string(),
    }
}

fn strip_thought_prefix(text: &str) -> &str {
    text.strip_prefix("Thought:").map(str::trim).unwrap_or(text)
}

/// Removes one pair of matching surrounding quotes, if present. Inner
/// quotes are kept as-is.
fn strip_matching_quotes(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if first == last && (first == b'"' || first == b'\'') {
            return &text[1..text.len() - 1];
        }
    }
    text
}
