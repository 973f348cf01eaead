//! Completion response types.

use serde::{Deserialize, Serialize};

use crate::types::{Message, StopReason, ToolCall, Usage};

/// Response from a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Response ID.
    pub id: String,

    /// Model used.
    pub model: String,

    /// The assistant message.
    pub message: Message,

    /// Why generation stopped.
    pub stop_reason: StopReason,

    /// Usage charged for this completion.
    #[serde(default)]
    pub usage: Usage,
}

impl CompletionResponse {
    /// Tool calls requested by the model.
    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.message.tool_calls
    }

    pub fn wants_tools(&self) -> bool {
        !self.message.tool_calls.is_empty()
    }
}
