//! Tool abstraction: named string-in/string-out capabilities the
//! reasoning loop may invoke mid-reasoning.

pub mod registry;
pub mod web;

pub use registry::ToolRegistry;
pub use web::WebFetchTool;

use async_trait::async_trait;

use crate::error::ToolError;

/// A capability the model can request by name.
///
/// Tools are string-in/string-out regardless of what they do internally;
/// the loop treats every observation as opaque text.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Dispatch key; the model must emit this verbatim to invoke the tool.
    fn name(&self) -> &str;

    /// Natural-language description included in the prompt's tool catalogue.
    fn description(&self) -> &str;

    /// Run the tool, producing an observation.
    async fn invoke(&self, input: &str) -> Result<String, ToolError>;
}

/// Name + description pair, snapshotted into the prompt context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
}
