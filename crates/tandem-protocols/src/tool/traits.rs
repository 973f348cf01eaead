//! Tool trait definition.

use async_trait::async_trait;

use super::{ToolContext, ToolDefinition, ToolResult};
use crate::error::ToolError;

/// Core trait for plain function tools.
///
/// Delegation to another agent is wired separately by the runtime; from the
/// calling agent's side both look the same.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool definition.
    fn definition(&self) -> &ToolDefinition;

    /// Execute the tool with the given parameters.
    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: ToolContext,
    ) -> Result<ToolResult, ToolError>;

    /// Validate the parameters before execution.
    fn validate(&self, params: &serde_json::Value) -> Result<(), ToolError> {
        let definition = self.definition();
        if let Some(schema) = &definition.parameters_schema {
            if schema.get("type") == Some(&serde_json::json!("object")) && !params.is_object() {
                return Err(ToolError::InvalidParameters(
                    "Parameters must be an object".to_string(),
                ));
            }
        }
        for name in definition.required_parameters() {
            if params.get(name).is_none_or(|v| v.is_null()) {
                return Err(ToolError::InvalidParameters(format!(
                    "Missing required parameter '{}'",
                    name
                )));
            }
        }
        Ok(())
    }
}
