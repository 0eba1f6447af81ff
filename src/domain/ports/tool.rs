//! Port implemented by every chat tool.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::ToolError;

/// A tool the model may invoke by emitting `{"tool": name, "parameters": {...}}`
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the model refers to
    fn name(&self) -> &str;

    /// One-line description included in the system instruction
    fn description(&self) -> &str;

    /// JSON Schema the parameters must satisfy before `execute` is called
    fn parameter_schema(&self) -> Value;

    /// Run the tool with already-validated parameters
    async fn execute(&self, parameters: Value) -> Result<String, ToolError>;
}
