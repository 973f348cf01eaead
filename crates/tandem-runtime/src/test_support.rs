//! Tools and agents shared by the runtime's unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use tandem_protocols::agent::{Agent, AgentConfig, AgentResult, Degradation, RunContext};
use tandem_protocols::error::{AgentError, ToolError};
use tandem_protocols::tool::{Tool, ToolContext, ToolDefinition, ToolResult};
use tandem_protocols::types::{ToolCallRecord, ToolCallStatus};

/// Echoes its `text` argument.
pub struct EchoTool {
    definition: ToolDefinition,
}

impl EchoTool {
    pub fn new(name: &str) -> Self {
        Self {
            definition: ToolDefinition::new(name, "Echo", "Echoes the text argument")
                .with_parameters_schema(json!({
                    "type": "object",
                    "properties": {"text": {"type": "string"}},
                    "required": ["text"]
                })),
        }
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, params: serde_json::Value, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        let text = params["text"].as_str().unwrap_or_default();
        Ok(ToolResult::success(format!("echo: {}", text)))
    }
}

/// Always fails.
pub struct FailingTool {
    definition: ToolDefinition,
}

impl FailingTool {
    pub fn new(name: &str) -> Self {
        Self {
            definition: ToolDefinition::new(name, "Failing", "Always fails"),
        }
    }
}

#[async_trait]
impl Tool for FailingTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, _params: serde_json::Value, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        Err(ToolError::ExecutionFailed("backend unavailable".to_string()))
    }
}

/// What a [`StubAgent`] saw when it was run.
#[derive(Debug, Clone)]
pub struct Observed {
    pub prompt: String,
    pub ctx: RunContext,
}

type Reply = Arc<dyn Fn() -> Result<String, AgentError> + Send + Sync>;

/// Agent that charges a fixed cost, records its context, and replies with
/// a canned result.
pub struct StubAgent {
    config: AgentConfig,
    units: u64,
    delay: Option<Duration>,
    degradations: Vec<Degradation>,
    reply: Reply,
    pub observed: Mutex<Vec<Observed>>,
}

impl StubAgent {
    pub fn replying(id: &str, text: &str) -> Self {
        let text = text.to_string();
        Self::with_reply(id, Arc::new(move || Ok(text.clone())))
    }

    pub fn failing(id: &str, make_error: fn() -> AgentError) -> Self {
        Self::with_reply(id, Arc::new(move || Err(make_error())))
    }

    fn with_reply(id: &str, reply: Reply) -> Self {
        Self {
            config: AgentConfig::new(id, id, "stub"),
            units: 7,
            delay: None,
            degradations: Vec::new(),
            reply,
            observed: Mutex::new(Vec::new()),
        }
    }

    /// Wait this long before replying, charging nothing if cancelled first.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report a failure recovered from inside the stub's own run.
    pub fn with_degradation(mut self, tool_name: &str, reason: &str) -> Self {
        self.degradations.push(Degradation {
            tool_name: tool_name.to_string(),
            reason: reason.to_string(),
        });
        self
    }

    pub fn last_seen(&self) -> Observed {
        self.observed.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl Agent for StubAgent {
    type Output = String;

    fn id(&self) -> &str {
        &self.config.id
    }

    fn config(&self) -> &AgentConfig {
        &self.config
    }

    async fn run(&self, prompt: &str, ctx: RunContext) -> Result<AgentResult<String>, AgentError> {
        self.observed.lock().unwrap().push(Observed {
            prompt: prompt.to_string(),
            ctx: ctx.clone(),
        });
        if ctx.exceeds_depth() {
            return Err(AgentError::DelegationDepthExceeded {
                depth: ctx.depth,
                max: ctx.max_depth,
            });
        }
        if let Some(delay) = self.delay {
            tokio::select! {
                _ = ctx.abort_signal.aborted() => return Err(AgentError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        ctx.ledger.record(self.units);
        let data = (self.reply)()?;
        Ok(AgentResult {
            data,
            usage: ctx.ledger.snapshot(),
            tool_calls: vec![ToolCallRecord {
                call_id: "inner_1".to_string(),
                tool_name: "inner_tool".to_string(),
                arguments: serde_json::Map::new(),
                result_summary: "inner".to_string(),
                status: ToolCallStatus::Succeeded,
                delegated: false,
                duration_ms: 0,
                nested: None,
            }],
            degradations: self.degradations.clone(),
        })
    }
}
