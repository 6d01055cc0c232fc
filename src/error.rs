//! Error types for the mail agent.

use std::time::Duration;

/// Top-level error type for the agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors. All of these are startup-fatal: the
/// process refuses to run partially configured.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Message store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Message {message_id} not found")]
    NotFound { message_id: String },

    #[error("Failed to read message {message_id}: {reason}")]
    ReadFailed { message_id: String, reason: String },
}

/// Outbound mail transport errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    BuildFailed(String),

    #[error("SMTP send failed: {0}")]
    SendFailed(String),
}

/// Model provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Model request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Model request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Invalid response from model: {reason}")]
    InvalidResponse { reason: String },

    #[error("Model request failed after {attempts} attempts: {reason}")]
    RetriesExhausted { attempts: u32, reason: String },
}

impl LlmError {
    /// Whether a fresh attempt could plausibly succeed. Malformed bodies
    /// are not transient: the request would be byte-identical.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RequestFailed { .. } | Self::Timeout { .. })
    }
}

/// Tool invocation errors.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool {name} execution failed: {reason}")]
    ExecutionFailed { name: String, reason: String },

    #[error("Tool {name} timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },

    #[error("Invalid input for tool {name}: {reason}")]
    InvalidInput { name: String, reason: String },
}

/// Per-email pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Delivery failed for {message_id}: {reason}")]
    DeliveryFailed { message_id: String, reason: String },

    #[error("Spool scan failed: {0}")]
    SpoolScan(String),
}

/// Result type alias for the agent.
pub type Result<T> = std::result::Result<T, Error>;
