//! Model integration.
//!
//! The hosted model is a black box behind the `ModelClient` trait: given a
//! conversation, return text, possibly slowly, possibly not at all. The
//! concrete client speaks the OpenAI-compatible chat completions API over
//! reqwest; tests substitute deterministic fakes.

pub mod openai;
pub(crate) mod retry;

pub use openai::OpenAiClient;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::ModelConfig;
use crate::error::LlmError;

/// Role of one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        f.write_str(name)
    }
}

/// One turn of a model conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Capability interface to the hosted model.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate a completion for the given conversation.
    ///
    /// Transport retries happen inside this call, bounded by configuration;
    /// a returned-but-malformed response is **not** retried here, that is
    /// the reasoning loop's parse-failure path.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;

    /// The configured model identifier.
    fn model_name(&self) -> &str;
}

/// Create a model client from configuration.
pub fn create_client(config: ModelConfig) -> Arc<dyn ModelClient> {
    tracing::info!(model = %config.model, "Using OpenAI-compatible model API");
    Arc::new(OpenAiClient::new(config))
}
