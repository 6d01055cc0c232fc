//! Prompt assembly for the reasoning loop.
//!
//! `assemble` is a pure function: the same request, context, and
//! scratchpad always produce the same ordered list of chat turns.
//! Executor state never leaks in through any other channel.

use crate::agent::executor::AgentStep;
use crate::email::NormalizedRequest;
use crate::llm::ChatMessage;
use crate::tools::ToolDescriptor;

/// Static configuration rendered into every prompt.
#[derive(Debug, Clone)]
pub struct PromptContext {
    /// Name the agent signs replies with.
    pub agent_name: String,
    /// Address the agent sends from, disclosed in the identity turn.
    pub agent_email: String,
    /// Optional description of where the agent's product knowledge
    /// comes from (a docs URL, a knowledge-base name).
    pub info_source: Option<String>,
    /// Catalogue of callable tools, in registration order.
    pub tools: Vec<ToolDescriptor>,
}

/// Builds the full conversation sent to the model for one loop
/// iteration. Four fixed turns: identity, tool catalogue and format
/// rules, an assistant acknowledgment, then the task turn carrying the
/// customer email and the rendered scratchpad ending in a `Thought:`
/// cue.
pub fn assemble(
    request: &NormalizedRequest,
    context: &PromptContext,
    scratchpad: &[AgentStep],
) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(identity_turn(context)),
        ChatMessage::user(format_turn(context)),
        ChatMessage::assistant(
            "Understood. I will reason step by step in that format and finish with a \
             Final Answer containing the complete reply email."
                .to_string(),
        ),
        ChatMessage::user(task_turn(request, scratchpad)),
    ]
}

/// Flattens assembled turns into one printable transcript. Used by
/// tests and debug logging.
pub fn render_text(messages: &[ChatMessage]) -> String {
    let mut out = String::new();
    for message in messages {
        out.push_str(&format!("[{}]\n{}\n\n", message.role, message.content));
    }
    out
}

fn identity_turn(context: &PromptContext) -> String {
    let mut turn = format!(
        "You are a customer support agent for a company. Your name is {}. \
         Your email address is {}. You are writing an email reply to a customer. \
         The customer's name is unknown to you.",
        non_empty(&context.agent_name, "the support agent"),
        non_empty(&context.agent_email, "support@example.com"),
    );
    if let Some(source) = &context.info_source
        && !source.trim().is_empty()
    {
        turn.push_str(&format!(
            " Information about the company and its products can be found at {}.",
            source.trim()
        ));
    }
    turn
}

fn format_turn(context: &PromptContext) -> String {
    let catalogue = if context.tools.is_empty() {
        "(none)".to_string()
    } else {
        context
            .tools
            .iter()
            .map(|tool| format!("{}: {}", tool.name, tool.description))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let names = context
        .tools
        .iter()
        .map(|tool| tool.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You have access to the following tools:\n\n{catalogue}\n\n\
         Use the following format:\n\n\
         Thought: you should always think about what to do\n\
         Action: the action to take, must be one of [{names}]\n\
         Action Input: the input to the action\n\
         Observation: the result of the action\n\
         ... (this Thought/Action/Action Input/Observation can repeat N times)\n\
         Thought: I now know the final answer\n\
         Final Answer: the complete reply email to send to the customer"
    )
}

fn task_turn(request: &NormalizedRequest, scratchpad: &[AgentStep]) -> String {
    format!(
        "Email sender: {}\n\
         Email subject: {}\n\
         Email history:\n{}\n\n\
         Task: given the email history, write an email response to the customer. \
         The response should be written in a polite and professional manner. \
         It is a final draft. Dont leave placeholder text.\n\n\
         {}Thought:",
        request.sender,
        request.subject,
        request.body,
        render_scratchpad(scratchpad),
    )
}

fn render_scratchpad(scratchpad: &[AgentStep]) -> String {
    let mut out = String::new();
    for step in scratchpad {
        out.push_str(&format!("Thought: {}\n", step.thought));
        if let Some(action) = &step.action {
            out.push_str(&format!(
                "Action: {}\nAction Input: {}\n",
                action.tool, action.input
            ));
        }
        if let Some(observation) = &step.observation {
            out.push_str(&format!("Observation: {observation}\n"));
        }
    }
    out
}

fn non_empty<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() { default } else { value }
}
