//! The closed set of tools an agent may call.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use tandem_protocols::agent::Degradation;
use tandem_protocols::error::ToolError;
use tandem_protocols::tool::{Tool, ToolContext, ToolDefinition, ToolResult};
use tandem_protocols::types::{ToolCall, ToolCallRecord, ToolCallStatus};

use crate::bridge::Delegation;
use crate::summary::summarize;

/// A tool as seen by the agent loop.
///
/// Both kinds are advertised to the model the same way; only the loop
/// treats a failed delegation differently from a failed function.
#[derive(Clone)]
pub enum ToolBinding {
    Function(Arc<dyn Tool>),
    Delegate(Arc<dyn Delegation>),
}

impl ToolBinding {
    pub fn definition(&self) -> &ToolDefinition {
        match self {
            ToolBinding::Function(tool) => tool.definition(),
            ToolBinding::Delegate(delegation) => delegation.definition(),
        }
    }

    pub fn name(&self) -> &str {
        &self.definition().id
    }

    pub fn is_delegation(&self) -> bool {
        matches!(self, ToolBinding::Delegate(_))
    }
}

/// Result of one invocation: the trace record, the text handed back to
/// the model, and the error if the call failed.
#[derive(Debug)]
pub struct ToolInvocation {
    pub record: ToolCallRecord,
    pub content: String,
    pub error: Option<ToolError>,
    /// Failures a delegate recovered from inside its own run.
    pub degradations: Vec<Degradation>,
}

/// Tools bound to an agent, fixed at construction.
#[derive(Clone, Default)]
pub struct ToolSet {
    bindings: Vec<ToolBinding>,
}

impl ToolSet {
    pub fn builder() -> ToolSetBuilder {
        ToolSetBuilder::default()
    }

    /// Resolve a binding by exact name.
    pub fn get(&self, name: &str) -> Option<&ToolBinding> {
        self.bindings.iter().find(|b| b.name() == name)
    }

    /// Definitions advertised to the model, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.bindings.iter().map(|b| b.definition().clone()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.bindings.iter().map(|b| b.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Invoke the tool a model asked for. Never fails: errors are captured
    /// in the returned record.
    ///
    /// Function tools are raced against the run's abort signal. A delegation
    /// is awaited to the end so the delegate can observe the abort itself
    /// and close its own run.
    pub async fn invoke(
        &self,
        call: &ToolCall,
        ctx: ToolContext,
        summary_max_chars: usize,
    ) -> ToolInvocation {
        let start = Instant::now();
        let binding = self.get(&call.name);
        let delegated = binding.is_some_and(|b| b.is_delegation());
        debug!("Invoking tool {} ({}), delegated={}", call.name, call.id, delegated);

        let outcome = match binding {
            None => Err(ToolError::NotFound(call.name.clone())),
            Some(ToolBinding::Function(tool)) => match tool.validate(&call.arguments) {
                Ok(()) => {
                    let abort_signal = Arc::clone(ctx.abort_signal());
                    tokio::select! {
                        biased;
                        _ = abort_signal.aborted() => Err(ToolError::Cancelled),
                        result = tool.execute(call.arguments.clone(), ctx) => result.map(Outcome::plain),
                    }
                }
                Err(e) => Err(e),
            },
            Some(ToolBinding::Delegate(delegation)) => delegation
                .delegate(call.arguments.clone(), ctx)
                .await
                .map(|output| {
                    debug!(
                        "Delegation {} cost {} units",
                        call.id, output.usage.units_consumed
                    );
                    Outcome {
                        summary_source: output.summary,
                        result: output.result,
                        nested: output.nested,
                        degradations: output.degradations,
                    }
                }),
        };
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (status, summary_source, content, nested, degradations, error) = match outcome {
            Ok(outcome) => (
                ToolCallStatus::Succeeded,
                outcome.summary_source,
                outcome.result.content,
                outcome.nested,
                outcome.degradations,
                None,
            ),
            Err(e) => {
                warn!("Tool {} failed: {}", call.name, e);
                let message = e.to_string();
                (
                    ToolCallStatus::Failed,
                    message.clone(),
                    format!("Error: {}", message),
                    None,
                    Vec::new(),
                    Some(e),
                )
            }
        };

        ToolInvocation {
            record: ToolCallRecord {
                call_id: call.id.clone(),
                tool_name: call.name.clone(),
                arguments: ToolCallRecord::arguments_map(&call.arguments),
                result_summary: summarize(&summary_source, summary_max_chars),
                status,
                delegated,
                duration_ms,
                nested,
            },
            content,
            error,
            degradations,
        }
    }
}

struct Outcome {
    result: ToolResult,
    summary_source: String,
    nested: Option<Vec<ToolCallRecord>>,
    degradations: Vec<Degradation>,
}

impl Outcome {
    fn plain(result: ToolResult) -> Self {
        Self {
            summary_source: result.content.clone(),
            result,
            nested: None,
            degradations: Vec::new(),
        }
    }
}

/// Builder for [`ToolSet`]; duplicate names are rejected at build time.
#[derive(Default)]
pub struct ToolSetBuilder {
    bindings: Vec<ToolBinding>,
}

impl ToolSetBuilder {
    pub fn function(mut self, tool: Arc<dyn Tool>) -> Self {
        self.bindings.push(ToolBinding::Function(tool));
        self
    }

    pub fn delegate(mut self, delegation: Arc<dyn Delegation>) -> Self {
        self.bindings.push(ToolBinding::Delegate(delegation));
        self
    }

    pub fn build(self) -> Result<ToolSet, ToolError> {
        let mut seen = HashSet::new();
        for binding in &self.bindings {
            if !seen.insert(binding.name().to_string()) {
                return Err(ToolError::AlreadyRegistered(binding.name().to_string()));
            }
        }
        Ok(ToolSet {
            bindings: self.bindings,
        })
    }
}

#[cfg(test)]
#[path = "toolset_tests.rs"]
mod tests;
