//! Tool registration and lookup.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{McpError, McpResult, ToolDefinition};

use super::arguments::ValidatedArgs;
use super::schema::ToolDescriptor;

/// The code behind one tool: validated arguments in, text out.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: ValidatedArgs) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct RegisteredTool {
    pub descriptor: ToolDescriptor,
    pub handler: Arc<dyn ToolHandler>,
}

/// Tools by name, filled at startup and read-only afterwards.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn ToolHandler>,
    ) -> McpResult<()> {
        if self.index.contains_key(&descriptor.name) {
            return Err(McpError::DuplicateTool(descriptor.name));
        }

        tracing::debug!(
            "Registered tool {} ({} parameters)",
            descriptor.name,
            descriptor.parameters.len()
        );
        self.index.insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool {
            descriptor,
            handler,
        });
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> McpResult<&RegisteredTool> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| McpError::UnknownTool(name.to_string()))
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter().map(|t| &t.descriptor)
    }

    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.list().map(ToolDescriptor::to_definition).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
