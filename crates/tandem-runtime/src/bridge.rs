//! Agent-to-agent delegation exposed as a tool.
//!
//! A [`DelegationTool`] lets the model of one agent hand a sub-task to
//! another agent. The sub-run shares the caller's ledger and abort lineage,
//! runs one level deeper, and uses the delegate's own dependency bundle.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

use tandem_protocols::agent::{Agent, AgentOutput, Degradation, NestedTrace};
use tandem_protocols::deps::Dependencies;
use tandem_protocols::error::ToolError;
use tandem_protocols::tool::{ToolContext, ToolDefinition, ToolResult};
use tandem_protocols::types::ToolCallRecord;
use tandem_protocols::usage::UsageSnapshot;

/// What a delegation hands back to the calling agent.
#[derive(Debug, Clone)]
pub struct DelegationOutput {
    /// Returned to the calling model.
    pub result: ToolResult,
    /// Digest source for the caller's trace record.
    pub summary: String,
    /// The delegate's trace, when attached.
    pub nested: Option<Vec<ToolCallRecord>>,
    /// Failures the delegate recovered from on its own.
    pub degradations: Vec<Degradation>,
    /// What the sub-run charged to the shared ledger.
    pub usage: UsageSnapshot,
}

/// A tool backed by another agent.
#[async_trait]
pub trait Delegation: Send + Sync {
    fn definition(&self) -> &ToolDefinition;

    /// ID of the agent the work is handed to.
    fn delegate_id(&self) -> &str;

    /// Run the delegate. A failed sub-run is reported as
    /// [`ToolError::DelegationFailed`], never as an empty success.
    async fn delegate(&self, params: Value, ctx: ToolContext) -> Result<DelegationOutput, ToolError>;
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static pattern is valid")
    })
}

/// Sub-prompt template with `{name}` placeholders filled from the tool
/// arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    placeholders: Vec<String>,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let mut seen = BTreeSet::new();
        let placeholders = placeholder_pattern()
            .captures_iter(&template)
            .map(|cap| cap[1].to_string())
            .filter(|name| seen.insert(name.clone()))
            .collect();
        Self {
            template,
            placeholders,
        }
    }

    /// Placeholder names in order of first appearance.
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Fill the template. Every placeholder must have a non-null argument.
    pub fn render(&self, args: &Value) -> Result<String, ToolError> {
        let Some(args) = args.as_object() else {
            return Err(ToolError::InvalidParameters(
                "Parameters must be an object".to_string(),
            ));
        };

        let missing: Vec<&str> = self
            .placeholders
            .iter()
            .filter(|name| args.get(name.as_str()).is_none_or(Value::is_null))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(ToolError::InvalidParameters(format!(
                "Missing required parameter(s): {}",
                missing.join(", ")
            )));
        }

        let rendered = placeholder_pattern().replace_all(&self.template, |cap: &regex::Captures| {
            match args.get(&cap[1]) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            }
        });
        Ok(rendered.into_owned())
    }

    /// JSON schema declaring every placeholder as a required string.
    pub fn parameters_schema(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .placeholders
            .iter()
            .map(|name| (name.clone(), serde_json::json!({ "type": "string" })))
            .collect();
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.placeholders,
        })
    }
}

/// Delegation to a concrete agent type.
pub struct DelegationTool<A: Agent> {
    definition: ToolDefinition,
    delegate: Arc<A>,
    deps: Dependencies,
    template: PromptTemplate,
    nested_trace: NestedTrace,
}

impl<A: Agent> DelegationTool<A> {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        delegate: Arc<A>,
        template: PromptTemplate,
    ) -> Self {
        let name = name.into();
        let definition = ToolDefinition::new(name.clone(), name, description)
            .with_parameters_schema(template.parameters_schema());
        Self {
            definition,
            delegate,
            deps: Dependencies::new(),
            template,
            nested_trace: NestedTrace::default(),
        }
    }

    /// The delegate's own dependency bundle.
    pub fn with_deps(mut self, deps: Dependencies) -> Self {
        self.deps = deps;
        self
    }

    pub fn with_nested_trace(mut self, nested_trace: NestedTrace) -> Self {
        self.nested_trace = nested_trace;
        self
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }
}

#[async_trait]
impl<A: Agent + 'static> Delegation for DelegationTool<A> {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    fn delegate_id(&self) -> &str {
        self.delegate.id()
    }

    async fn delegate(&self, params: Value, ctx: ToolContext) -> Result<DelegationOutput, ToolError> {
        let prompt = self.template.render(&params)?;
        let run_ctx = ctx.delegated_run(self.deps.clone());
        info!(
            "Agent '{}' delegating to '{}' at depth {}",
            ctx.agent_id,
            self.delegate.id(),
            run_ctx.depth
        );
        debug!("Delegated prompt: {}", prompt);

        let before = ctx.ledger().snapshot();
        let result = self.delegate.run(&prompt, run_ctx).await;
        let usage = ctx.ledger().snapshot().since(&before);
        info!(
            "Delegate '{}' charged {} requests / {} units",
            self.delegate.id(),
            usage.requests_issued,
            usage.units_consumed
        );
        let result = result.map_err(|cause| ToolError::DelegationFailed {
            agent: self.delegate.id().to_string(),
            cause: Box::new(cause),
        })?;

        let result_value = match result.data.to_tool_output() {
            Value::String(text) => ToolResult::success(text),
            other => ToolResult::json(other),
        };
        let nested = match self.nested_trace {
            NestedTrace::Attached => Some(result.tool_calls),
            NestedTrace::Opaque => None,
        };

        Ok(DelegationOutput {
            summary: result.data.summary(),
            result: result_value,
            nested,
            degradations: result.degradations,
            usage,
        })
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
