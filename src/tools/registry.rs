//! Tool registry: an ordered set of named capabilities.
//!
//! Order matters: the prompt lists tools in registration order, so the
//! catalogue the model sees is deterministic. The registry is built once
//! at startup and shared read-only; no interior mutability needed.

use std::sync::Arc;

use crate::tools::{Tool, ToolDescriptor};

/// Registry of available tools, in registration order.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Duplicate names are rejected; the first
    /// registration wins, since the name is the model's dispatch key.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        if self.get(tool.name()).is_some() {
            tracing::warn!(tool = %tool.name(), "Duplicate tool name, ignoring registration");
            return;
        }
        tracing::debug!(tool = %tool.name(), "Registered tool");
        self.tools.push(tool);
    }

    /// Look up a tool by its exact name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Whether a tool with this name exists.
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of registered tools.
    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// Name + description pairs in registration order, for prompt assembly.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|t| ToolDescriptor {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
