//! Tool execution result types.

use serde::{Deserialize, Serialize};

/// Result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Output content handed back to the model.
    pub content: String,

    /// Structured output (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_output: Option<serde_json::Value>,
}

impl ToolResult {
    /// Create a successful result with text content.
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            structured_output: None,
        }
    }

    /// Create a successful result with structured output; the content is
    /// the compact JSON rendering.
    pub fn json(output: serde_json::Value) -> Self {
        Self {
            content: output.to_string(),
            structured_output: Some(output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success() {
        let result = ToolResult::success("done");
        assert_eq!(result.content, "done");
        assert!(result.structured_output.is_none());
    }

    #[test]
    fn test_json() {
        let result = ToolResult::json(serde_json::json!({"draft_id": "d-1"}));
        assert_eq!(result.content, r#"{"draft_id":"d-1"}"#);
        assert!(result.structured_output.is_some());
    }
}
