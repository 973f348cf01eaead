//! Completion request types.

use serde::{Deserialize, Serialize};

use crate::deps::Dependencies;
use crate::tool::ToolDefinition;
use crate::types::Message;

/// Request for a completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Agent issuing the request.
    pub agent_id: String,

    /// Model to use.
    pub model: String,

    /// System message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Messages in the transcript so far.
    pub messages: Vec<Message>,

    /// Tools the model may call.
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,

    /// The issuing agent's dependency bundle; never sent over the wire.
    #[serde(skip)]
    pub deps: Dependencies,
}

impl CompletionRequest {
    /// Create a new completion request.
    pub fn new(agent_id: impl Into<String>, model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            agent_id: agent_id.into(),
            model: model.into(),
            system: None,
            messages,
            tools: Vec::new(),
            deps: Dependencies::new(),
        }
    }

    /// Set the system message.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the tools.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_deps(mut self, deps: Dependencies) -> Self {
        self.deps = deps;
        self
    }

    /// Text of the last user message, if any.
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::types::MessageRole::User)
            .map(|m| m.content.as_str())
    }
}
