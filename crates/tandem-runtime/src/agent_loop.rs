//! Generation loop shared by every runtime agent.

use tracing::{debug, info, warn};

use tandem_protocols::agent::{AgentConfig, Degradation, FailurePolicy, RunContext, RunState};
use tandem_protocols::error::{AgentError, ToolError};
use tandem_protocols::event::StreamEvent;
use tandem_protocols::provider::{CompletionRequest, LLMProvider};
use tandem_protocols::tool::ToolContext;
use tandem_protocols::types::{Message, ToolCall, ToolCallRecord};

use crate::toolset::ToolSet;

/// What a loop produces before the final text is turned into a typed output.
pub(crate) struct LoopOutcome {
    pub final_text: String,
    pub tool_calls: Vec<ToolCallRecord>,
    pub degradations: Vec<Degradation>,
}

pub(crate) struct AgentLoop<'a> {
    config: &'a AgentConfig,
    provider: &'a dyn LLMProvider,
    tools: &'a ToolSet,
    ctx: &'a RunContext,
}

impl<'a> AgentLoop<'a> {
    pub fn new(
        config: &'a AgentConfig,
        provider: &'a dyn LLMProvider,
        tools: &'a ToolSet,
        ctx: &'a RunContext,
    ) -> Self {
        Self {
            config,
            provider,
            tools,
            ctx,
        }
    }

    /// Check the prompt and the depth. Nothing is charged when this fails.
    pub fn admit(&self, prompt: &str) -> Result<(), AgentError> {
        if prompt.trim().is_empty() {
            return Err(AgentError::InvalidInput("prompt must not be empty".to_string()));
        }
        if self.ctx.exceeds_depth() {
            return Err(AgentError::DelegationDepthExceeded {
                depth: self.ctx.depth,
                max: self.ctx.max_depth,
            });
        }
        Ok(())
    }

    /// Drive generation steps and tool calls until the model answers
    /// without requesting tools.
    pub async fn run(&self, prompt: &str) -> Result<LoopOutcome, AgentError> {
        let mut messages = vec![Message::user(prompt)];
        let mut tool_calls = Vec::new();
        let mut degradations = Vec::new();
        let mut turns = 0;

        loop {
            if self.ctx.is_aborted() {
                return Err(AgentError::Cancelled);
            }

            if turns >= self.config.max_turns {
                return Err(AgentError::MaxTurnsExceeded(self.config.max_turns));
            }

            turns += 1;
            self.set_state(RunState::Planning);
            debug!(
                "Agent '{}' turn {}/{} at depth {}",
                self.config.id, turns, self.config.max_turns, self.ctx.depth
            );

            let request = self.build_request(&messages);
            let response = tokio::select! {
                biased;
                _ = self.ctx.abort_signal.aborted() => return Err(AgentError::Cancelled),
                response = self.provider.complete(request) => response?,
            };
            self.ctx.ledger.record(response.usage.units());

            if !response.message.content.is_empty() {
                self.ctx.events.emit(StreamEvent::TextDelta {
                    agent_id: self.config.id.clone(),
                    depth: self.ctx.depth,
                    content: response.message.content.clone(),
                });
            }

            if !response.wants_tools() {
                info!("Agent '{}' finished planning after {} turns", self.config.id, turns);
                return Ok(LoopOutcome {
                    final_text: response.message.content,
                    tool_calls,
                    degradations,
                });
            }

            let calls = response.message.tool_calls.clone();
            messages.push(response.message);
            self.set_state(RunState::ToolExecuting);

            for call in &calls {
                let (record, content) = self.invoke(call, &mut degradations).await?;
                tool_calls.push(record);
                messages.push(Message::tool(&call.id, content));
            }
        }
    }

    /// Run one tool call and apply the failure policy.
    ///
    /// Returns the trace record and the text fed back to the model, or the
    /// error that ends the run.
    async fn invoke(
        &self,
        call: &ToolCall,
        degradations: &mut Vec<Degradation>,
    ) -> Result<(ToolCallRecord, String), AgentError> {
        let delegated = self.tools.get(&call.name).is_some_and(|b| b.is_delegation());
        self.ctx.events.emit(StreamEvent::ToolCallStart {
            agent_id: self.config.id.clone(),
            depth: self.ctx.depth,
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            arguments: call.arguments.clone(),
            delegated,
        });

        // Awaited to the end: the tool set observes the abort signal itself,
        // and a delegate must close its own run.
        let tool_ctx = ToolContext::for_call(self.ctx, &self.config.id, &call.id);
        let invocation = self
            .tools
            .invoke(call, tool_ctx, self.config.summary_max_chars)
            .await;

        self.ctx.events.emit(StreamEvent::ToolCallComplete {
            agent_id: self.config.id.clone(),
            depth: self.ctx.depth,
            record: invocation.record.clone(),
        });

        match invocation.error {
            None => {
                degradations.extend(invocation.degradations.into_iter().map(|nested| Degradation {
                    tool_name: format!("{}/{}", call.name, nested.tool_name),
                    reason: nested.reason,
                }));
            }
            Some(ToolError::Cancelled) => return Err(AgentError::Cancelled),
            Some(ToolError::DelegationFailed { cause, .. }) => match *cause {
                cause @ (AgentError::Cancelled | AgentError::DelegationDepthExceeded { .. }) => {
                    return Err(cause);
                }
                cause => match self.config.failure_policy {
                    FailurePolicy::Fatal => {
                        warn!(
                            "Agent '{}' aborting: delegation via '{}' failed: {}",
                            self.config.id, call.name, cause
                        );
                        return Err(AgentError::DelegationFailure {
                            tool: call.name.clone(),
                            cause: Box::new(cause),
                        });
                    }
                    FailurePolicy::Recover => {
                        warn!(
                            "Agent '{}' continuing without '{}': {}",
                            self.config.id, call.name, cause
                        );
                        let degradation = Degradation {
                            tool_name: call.name.clone(),
                            reason: cause.to_string(),
                        };
                        self.ctx.events.emit(StreamEvent::Degraded {
                            agent_id: self.config.id.clone(),
                            depth: self.ctx.depth,
                            degradation: degradation.clone(),
                        });
                        degradations.push(degradation);
                    }
                },
            },
            Some(_) => {}
        }

        Ok((invocation.record, invocation.content))
    }

    fn build_request(&self, messages: &[Message]) -> CompletionRequest {
        let mut request = CompletionRequest::new(&self.config.id, &self.config.model, messages.to_vec())
            .with_tools(self.tools.definitions())
            .with_deps(self.ctx.deps.clone());
        if let Some(system) = &self.config.system_prompt {
            request = request.with_system(system.clone());
        }
        request
    }

    pub fn set_state(&self, state: RunState) {
        self.ctx.events.emit(StreamEvent::StateChanged {
            agent_id: self.config.id.clone(),
            depth: self.ctx.depth,
            state,
        });
    }
}
