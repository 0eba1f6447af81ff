//! Registry of chat tools with their compiled parameter schemas.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::errors::ToolError;
use crate::domain::models::ToolInvocation;
use crate::domain::ports::Tool;

struct RegisteredTool {
    tool: Arc<dyn Tool>,
    schema: JSONSchema,
}

/// Tools available to the chat relay, keyed by name.
///
/// Built once at start-up; parameter schemas are compiled on registration.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, RegisteredTool>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, replacing any tool of the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let schema_value = tool.parameter_schema();
        let schema = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema_value)
            .map_err(|e| {
                ToolError::validation(tool.name(), format!("invalid parameter schema: {e}"))
            })?;

        debug!(tool = tool.name(), "registered tool");
        self.tools
            .insert(tool.name().to_string(), RegisteredTool { tool, schema });
        Ok(())
    }

    /// Builder form of [`Self::register`]
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Result<Self, ToolError> {
        self.register(tool)?;
        Ok(self)
    }

    /// Tool registered as `name`
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|entry| Arc::clone(&entry.tool))
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    /// Number of tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tool is registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// System instruction describing every tool and the call format
    pub fn system_prompt(&self) -> String {
        let catalog = self
            .tools
            .values()
            .map(|entry| {
                format!(
                    "Tool: {}\nDescription: {}\nParameters: {}",
                    entry.tool.name(),
                    entry.tool.description(),
                    entry.tool.parameter_schema()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "You are a helpful AI assistant. You may use tools when appropriate. \
             If you need to use a tool, respond in this JSON format only:\n\n\
             {{\n  \"tool\": \"toolName\",\n  \"parameters\": {{ ... }}\n}}\n\n\
             Available tools:\n{catalog}\n"
        )
    }

    /// Check `parameters` against the tool's schema
    pub fn validate(&self, name: &str, parameters: &Value) -> Result<(), ToolError> {
        let entry = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        if let Err(errors) = entry.schema.validate(parameters) {
            let reasons: Vec<String> = errors
                .map(|e| format!("{}: {}", e.instance_path, e))
                .collect();
            return Err(ToolError::validation(name, reasons.join(", ")));
        }
        Ok(())
    }

    /// Resolve, parse, validate and run an embedded tool call
    pub async fn dispatch(&self, invocation: &ToolInvocation) -> Result<String, ToolError> {
        let tool = self
            .get(&invocation.tool)
            .ok_or_else(|| ToolError::NotFound(invocation.tool.clone()))?;

        let parameters: Value = serde_json::from_str(&invocation.raw_parameters)
            .map_err(|e| ToolError::validation(&invocation.tool, format!("not JSON: {e}")))?;

        self.validate(&invocation.tool, &parameters)?;

        info!(tool = %invocation.tool, "executing tool");
        tool.execute(parameters).await
    }
}
