//! Agent protocol definitions.
//!
//! An agent turns a prompt into a typed [`AgentResult`]. Agents never own
//! the ledger or the abort signal; both arrive through the [`RunContext`]
//! so that a whole call tree shares them.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::deps::Dependencies;
use crate::error::{AgentError, ProviderError};
use crate::event::EventSink;
use crate::tool::AbortSignal;
use crate::types::ToolCallRecord;
use crate::usage::{UsageLedger, UsageSnapshot};

/// Default bound on nesting: an orchestrator may call a delegate, which
/// may not delegate further.
pub const DEFAULT_MAX_DEPTH: u32 = 1;

/// Core trait for agents.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Typed result produced by a successful run.
    type Output: AgentOutput;

    /// Returns the agent ID.
    fn id(&self) -> &str;

    /// Returns the agent configuration.
    fn config(&self) -> &AgentConfig;

    /// Human-readable name.
    fn name(&self) -> &str {
        &self.config().name
    }

    /// Run the agent on a prompt.
    ///
    /// Usage is charged to `ctx.ledger`. A blank prompt fails with
    /// [`AgentError::InvalidInput`] before anything is charged.
    async fn run(
        &self,
        prompt: &str,
        ctx: RunContext,
    ) -> Result<AgentResult<Self::Output>, AgentError>;
}

/// What a calling agent does when one of its delegates fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Feed the failure back to the model and mark the result degraded.
    #[default]
    Recover,
    /// Abort the run with [`AgentError::DelegationFailure`].
    Fatal,
}

/// Whether a delegation record carries the delegate's own trace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestedTrace {
    /// The caller's trace shows one record per delegation and nothing more.
    #[default]
    Opaque,
    /// The delegate's records are attached under the delegation record.
    Attached,
}

/// Agent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent ID.
    pub id: String,

    /// Human-readable name.
    #[serde(default)]
    pub name: String,

    /// Description of the agent.
    #[serde(default)]
    pub description: String,

    /// Model to use.
    pub model: String,

    /// System prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Maximum generation turns per run.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Upper bound on a tool result summary in the trace.
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,
}

fn default_max_turns() -> u32 {
    10
}

fn default_summary_max_chars() -> usize {
    200
}

impl AgentConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            model: model.into(),
            system_prompt: None,
            max_turns: default_max_turns(),
            failure_policy: FailurePolicy::default(),
            summary_max_chars: default_summary_max_chars(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_summary_max_chars(mut self, max_chars: usize) -> Self {
        self.summary_max_chars = max_chars;
        self
    }
}

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Received,
    Planning,
    ToolExecuting,
    Finalizing,
    Completed,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }
}

/// A delegate failure the run recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degradation {
    /// Tool through which the failed delegation was made.
    pub tool_name: String,
    pub reason: String,
}

/// Typed outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct AgentResult<T> {
    /// The agent's typed output.
    pub data: T,

    /// Ledger totals at the moment the run finished. For a top-level run
    /// this is the consumption of the entire call tree.
    pub usage: UsageSnapshot,

    /// One record per tool invocation, in invocation order.
    pub tool_calls: Vec<ToolCallRecord>,

    /// Delegate failures the run carried on through.
    #[serde(default)]
    pub degradations: Vec<Degradation>,
}

impl<T> AgentResult<T> {
    /// True when at least one delegate failed and was recovered from.
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }

    pub fn delegated_calls(&self) -> impl Iterator<Item = &ToolCallRecord> {
        self.tool_calls.iter().filter(|r| r.delegated)
    }

    /// Convert the payload, keeping the bookkeeping.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AgentResult<U> {
        AgentResult {
            data: f(self.data),
            usage: self.usage,
            tool_calls: self.tool_calls,
            degradations: self.degradations,
        }
    }
}

/// Typed output an agent produces from the model's final text.
pub trait AgentOutput: Sized + Send + Sync + 'static {
    /// Parse the final assistant text into the output type.
    fn from_final_text(text: &str) -> Result<Self, AgentError>;

    /// Value handed back to a calling agent when this output is the result
    /// of a delegation.
    fn to_tool_output(&self) -> serde_json::Value;

    /// Short human-readable digest.
    fn summary(&self) -> String;
}

impl AgentOutput for String {
    fn from_final_text(text: &str) -> Result<Self, AgentError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AgentError::GenerationFailure(ProviderError::InvalidResponse(
                "model returned no final text".to_string(),
            )));
        }
        Ok(text.to_string())
    }

    fn to_tool_output(&self) -> serde_json::Value {
        serde_json::Value::String(self.clone())
    }

    fn summary(&self) -> String {
        self.clone()
    }
}

/// Parse a JSON output out of final model text.
///
/// A surrounding Markdown code fence is tolerated.
pub fn parse_json_output<T: DeserializeOwned>(text: &str) -> Result<T, AgentError> {
    let body = strip_code_fence(text.trim());
    serde_json::from_str(body).map_err(|e| {
        AgentError::GenerationFailure(ProviderError::InvalidResponse(format!(
            "final text is not valid output: {}",
            e
        )))
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Everything a run shares with the rest of its call tree.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Unique ID of this run.
    pub run_id: String,

    /// Dependency bundle of the agent being run.
    pub deps: Dependencies,

    /// Ledger shared by the whole call tree.
    pub ledger: Arc<UsageLedger>,

    /// 0 for a top-level run, incremented per delegation.
    pub depth: u32,

    pub max_depth: u32,

    pub abort_signal: Arc<AbortSignal>,

    pub events: EventSink,
}

impl RunContext {
    /// Context for a top-level run.
    pub fn new(deps: Dependencies, ledger: Arc<UsageLedger>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            deps,
            ledger,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            abort_signal: Arc::new(AbortSignal::new()),
            events: EventSink::disabled(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn with_abort_signal(mut self, abort_signal: Arc<AbortSignal>) -> Self {
        self.abort_signal = abort_signal;
        self
    }

    pub fn is_aborted(&self) -> bool {
        self.abort_signal.is_aborted()
    }

    /// True when this run is deeper than nesting allows.
    pub fn exceeds_depth(&self) -> bool {
        self.depth > self.max_depth
    }

    /// Context for a sub-run one level deeper.
    ///
    /// The ledger and event sink are shared; the abort signal is a child of
    /// this run's signal, so aborting this run aborts the sub-run too.
    pub fn delegated(&self, deps: Dependencies) -> RunContext {
        RunContext {
            run_id: uuid::Uuid::new_v4().to_string(),
            deps,
            ledger: Arc::clone(&self.ledger),
            depth: self.depth.saturating_add(1),
            max_depth: self.max_depth,
            abort_signal: Arc::new(self.abort_signal.child()),
            events: self.events.clone(),
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
