//! The think-act-observe loop.
//!
//! One `run` drives the model through at most `max_iterations`
//! completions. Every completion is parsed into a [`Directive`]: a
//! `Final Answer` terminates the loop, an `Action` invokes a tool and
//! appends the observation to the scratchpad, and unparseable text
//! either aborts immediately (when it carries a recoverable answer for
//! the sanitizer to salvage) or earns a format reminder and another
//! attempt. The loop always terminates: the iteration cap and the wall
//! clock deadline bound every path, whatever the model returns.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::agent::parser::{Directive, parse_directive};
use crate::agent::prompt::{PromptContext, assemble};
use crate::agent::sanitizer::recover_partial_answer;
use crate::email::NormalizedRequest;
use crate::error::LlmError;
use crate::llm::ModelClient;
use crate::tools::ToolRegistry;

/// One past tool invocation, replayed into subsequent prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub tool: String,
    pub input: String,
}

/// One completed loop iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentStep {
    pub thought: String,
    pub action: Option<ToolInvocation>,
    pub observation: Option<String>,
}

/// Why a run ended without a final answer.
#[derive(Debug)]
pub enum AbortReason {
    /// A completion matched neither grammar shape but looks like an
    /// attempted answer; carries the raw text for sanitizer recovery.
    Unparseable(String),
    /// The iteration cap was reached without a final answer.
    IterationBudget,
    /// The wall-clock deadline expired.
    DeadlineExceeded,
    /// The model client failed after its own retries.
    Model(LlmError),
}

/// Terminal state of one run.
#[derive(Debug)]
pub enum LoopOutcome {
    /// The model produced a `Final Answer`.
    Done(String),
    Aborted(AbortReason),
}

/// Drives the reasoning loop for one inbound email.
pub struct AgentExecutor {
    model: Arc<dyn ModelClient>,
    tools: Arc<ToolRegistry>,
    context: PromptContext,
    max_iterations: u32,
    deadline: Duration,
}

impl AgentExecutor {
    pub fn new(
        model: Arc<dyn ModelClient>,
        tools: Arc<ToolRegistry>,
        context: PromptContext,
        max_iterations: u32,
        deadline: Duration,
    ) -> Self {
        Self {
            model,
            tools,
            context,
            max_iterations,
            deadline,
        }
    }

    /// Runs the loop to a terminal outcome. Never panics and never
    /// returns a transport-level error: every failure mode is folded
    /// into [`LoopOutcome::Aborted`] for the sanitizer to handle.
    pub async fn run(&self, request: &NormalizedRequest) -> LoopOutcome {
        let started = Instant::now();
        let mut scratchpad: Vec<AgentStep> = Vec::new();

        for iteration in 1..=self.max_iterations {
            let remaining = self.deadline.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                tracing::warn!(iteration, "Reasoning loop hit its deadline");
                return LoopOutcome::Aborted(AbortReason::DeadlineExceeded);
            }

            let messages = assemble(request, &self.context, &scratchpad);
            let raw = match tokio::time::timeout(remaining, self.model.complete(&messages)).await {
                Err(_) => {
                    tracing::warn!(iteration, "Model call ran past the loop deadline");
                    return LoopOutcome::Aborted(AbortReason::DeadlineExceeded);
                }
                Ok(Err(err)) => {
                    tracing::error!(iteration, error = %err, "Model call failed");
                    return LoopOutcome::Aborted(AbortReason::Model(err));
                }
                Ok(Ok(raw)) => raw,
            };

            match parse_directive(&raw) {
                Directive::FinalAnswer(answer) => {
                    tracing::debug!(iteration, "Loop reached a final answer");
                    return LoopOutcome::Done(answer);
                }
                Directive::Action {
                    thought,
                    tool,
                    input,
                } => {
                    let observation = self.observe(&tool, &input).await;
                    tracing::debug!(iteration, tool = %tool, "Tool step recorded");
                    scratchpad.push(AgentStep {
                        thought,
                        action: Some(ToolInvocation { tool, input }),
                        observation: Some(observation),
                    });
                }
                Directive::Unparseable(text) => {
                    if recover_partial_answer(&text).is_some() {
                        // The model tried to answer but missed the
                        // grammar; hand the text to the sanitizer
                        // rather than burning iterations re-asking.
                        tracing::warn!(iteration, "Completion unparseable but salvageable");
                        return LoopOutcome::Aborted(AbortReason::Unparseable(text));
                    }
                    tracing::warn!(iteration, "Completion matched no grammar shape");
                    scratchpad.push(AgentStep {
                        thought: text.clone(),
                        action: None,
                        observation: Some(
                            "That reply did not follow the required format. Respond with \
                             either an Action and Action Input, or a Final Answer."
                                .to_string(),
                        ),
                    });
                }
            }
        }

        LoopOutcome::Aborted(AbortReason::IterationBudget)
    }

    /// Resolves one tool invocation into an observation string. Tool
    /// failure is a recoverable observation, not a loop error.
    async fn observe(&self, tool: &str, input: &str) -> String {
        match self.tools.get(tool) {
            None => format!("no tool named '{tool}' is available"),
            Some(found) => match found.invoke(input).await {
                Ok(output) => output,
                Err(err) => format!("tool '{tool}' failed: {err}"),
            },
        }
    }
}
