//! General-purpose agent driven by an LLM provider.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use tandem_protocols::agent::{Agent, AgentConfig, AgentOutput, AgentResult, RunContext, RunState};
use tandem_protocols::error::AgentError;
use tandem_protocols::event::StreamEvent;
use tandem_protocols::provider::LLMProvider;

use crate::agent_loop::AgentLoop;
use crate::toolset::ToolSet;

/// Agent that plans with a provider, calls tools from its [`ToolSet`],
/// and parses the final answer into `O`.
pub struct GeneralAgent<O = String> {
    config: AgentConfig,
    provider: Arc<dyn LLMProvider>,
    tools: ToolSet,
    _output: PhantomData<fn() -> O>,
}

impl<O: AgentOutput> GeneralAgent<O> {
    pub fn new(config: AgentConfig, provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            config,
            provider,
            tools: ToolSet::default(),
            _output: PhantomData,
        }
    }

    pub fn with_tools(mut self, tools: ToolSet) -> Self {
        self.tools = tools;
        self
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    async fn execute(
        &self,
        agent_loop: &AgentLoop<'_>,
        prompt: &str,
        ctx: &RunContext,
    ) -> Result<AgentResult<O>, AgentError> {
        agent_loop.admit(prompt)?;
        let outcome = agent_loop.run(prompt).await?;

        agent_loop.set_state(RunState::Finalizing);
        let data = O::from_final_text(&outcome.final_text)?;

        Ok(AgentResult {
            data,
            usage: ctx.ledger.snapshot(),
            tool_calls: outcome.tool_calls,
            degradations: outcome.degradations,
        })
    }
}

#[async_trait]
impl<O: AgentOutput> Agent for GeneralAgent<O> {
    type Output = O;

    fn id(&self) -> &str {
        &self.config.id
    }

    fn config(&self) -> &AgentConfig {
        &self.config
    }

    async fn run(&self, prompt: &str, ctx: RunContext) -> Result<AgentResult<O>, AgentError> {
        info!(
            "Agent '{}' run {} started at depth {}",
            self.config.id, ctx.run_id, ctx.depth
        );
        ctx.events.emit(StreamEvent::RunStarted {
            run_id: ctx.run_id.clone(),
            agent_id: self.config.id.clone(),
            depth: ctx.depth,
        });

        let agent_loop = AgentLoop::new(&self.config, self.provider.as_ref(), &self.tools, &ctx);
        agent_loop.set_state(RunState::Received);
        let result = self.execute(&agent_loop, prompt, &ctx).await;

        match &result {
            Ok(result) => {
                agent_loop.set_state(RunState::Completed);
                info!(
                    "Agent '{}' run {} completed: {} tool calls, {} units consumed so far",
                    self.config.id,
                    ctx.run_id,
                    result.tool_calls.len(),
                    result.usage.units_consumed
                );
                ctx.events.emit(StreamEvent::RunFinished {
                    run_id: ctx.run_id.clone(),
                    agent_id: self.config.id.clone(),
                    depth: ctx.depth,
                    usage: result.usage,
                });
            }
            Err(e) => {
                agent_loop.set_state(RunState::Failed);
                warn!("Agent '{}' run {} failed: {}", self.config.id, ctx.run_id, e);
                ctx.events.emit(StreamEvent::RunFailed {
                    run_id: ctx.run_id.clone(),
                    agent_id: self.config.id.clone(),
                    depth: ctx.depth,
                    error: e.to_string(),
                });
            }
        }

        result
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
