//! The reasoning agent: prompt assembly, the think-act-observe loop,
//! model-output parsing, and final-answer sanitization.

pub mod executor;
pub mod parser;
pub mod prompt;
pub mod sanitizer;

pub use executor::{AbortReason, AgentExecutor, AgentStep, LoopOutcome, ToolInvocation};
pub use parser::{Directive, parse_directive};
pub use prompt::{PromptContext, assemble, render_text};
pub use sanitizer::{AgentResult, FALLBACK_REPLY, sanitize};
