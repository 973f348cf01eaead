//! Script format.
//!
//! ```json
//! {
//!   "agents": {
//!     "research": [
//!       { "type": "tool_calls", "calls": [{ "name": "search_web", "arguments": { "query": "rust" } }] },
//!       { "type": "text", "text": "Rust is a systems language.", "usage": { "prompt_tokens": 40, "completion_tokens": 12 } }
//!     ]
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tandem_protocols::Usage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid script: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Script for agent '{0}' has no turns")]
    EmptyAgent(String),
}

/// Turns to replay, keyed by agent id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub agents: HashMap<String, Vec<ScriptedTurn>>,
}

impl Script {
    /// Load a script from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ScriptError> {
        let script: Script = serde_json::from_str(content)?;
        if let Some((agent, _)) = script.agents.iter().find(|(_, turns)| turns.is_empty()) {
            return Err(ScriptError::EmptyAgent(agent.clone()));
        }
        Ok(script)
    }
}

/// One scripted completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedTurn {
    #[serde(flatten)]
    pub reply: ScriptedReply,

    /// Usage to report; estimated from text length when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ScriptedUsage>,

    /// Artificial latency before the reply.
    #[serde(default)]
    pub delay_ms: u64,
}

impl ScriptedTurn {
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_reply(ScriptedReply::Text { text: text.into() })
    }

    /// A turn requesting a single tool call.
    pub fn tool_call(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self::tool_calls(vec![ScriptedCall {
            name: name.into(),
            arguments,
        }])
    }

    pub fn tool_calls(calls: Vec<ScriptedCall>) -> Self {
        Self::from_reply(ScriptedReply::ToolCalls {
            text: String::new(),
            calls,
        })
    }

    /// A failing turn. Retryable failures surface as network errors.
    pub fn error(message: impl Into<String>, retryable: bool) -> Self {
        Self::from_reply(ScriptedReply::Error {
            message: message.into(),
            retryable,
        })
    }

    pub fn with_usage(mut self, prompt_tokens: u32, completion_tokens: u32) -> Self {
        self.usage = Some(ScriptedUsage {
            prompt_tokens,
            completion_tokens,
        });
        self
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    fn from_reply(reply: ScriptedReply) -> Self {
        Self {
            reply,
            usage: None,
            delay_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptedReply {
    Text {
        text: String,
    },
    ToolCalls {
        #[serde(default)]
        text: String,
        calls: Vec<ScriptedCall>,
    },
    Error {
        message: String,
        #[serde(default)]
        retryable: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedCall {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedUsage {
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

impl From<ScriptedUsage> for Usage {
    fn from(usage: ScriptedUsage) -> Self {
        Usage::new(usage.prompt_tokens, usage.completion_tokens)
    }
}
