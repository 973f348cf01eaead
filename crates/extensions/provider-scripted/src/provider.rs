//! Scripted provider implementation.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use tandem_protocols::error::ProviderError;
use tandem_protocols::provider::{CompletionRequest, CompletionResponse, LLMProvider};
use tandem_protocols::types::{Message, StopReason, ToolCall, Usage};

use crate::script::{Script, ScriptedReply, ScriptedTurn};

/// Rough characters-per-token ratio used when a turn has no usage.
const CHARS_PER_TOKEN: usize = 4;

/// Provider that replays scripted turns, one queue per agent id.
///
/// Tool call ids are deterministic (`call_<agent>_<n>`), so identical
/// scripts produce identical traces.
pub struct ScriptedProvider {
    id: String,
    turns: DashMap<String, VecDeque<ScriptedTurn>>,
    requests: Mutex<Vec<CompletionRequest>>,
    next_call: AtomicU64,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            id: "scripted".to_string(),
            turns: DashMap::new(),
            requests: Mutex::new(Vec::new()),
            next_call: AtomicU64::new(1),
        }
    }

    pub fn from_script(script: Script) -> Self {
        let provider = Self::new();
        for (agent_id, turns) in script.agents {
            provider.turns.insert(agent_id, turns.into());
        }
        provider
    }

    /// Queue turns for an agent.
    pub fn with_turns(self, agent_id: impl Into<String>, turns: impl IntoIterator<Item = ScriptedTurn>) -> Self {
        let agent_id = agent_id.into();
        for turn in turns {
            self.push(&agent_id, turn);
        }
        self
    }

    pub fn push(&self, agent_id: &str, turn: ScriptedTurn) {
        self.turns
            .entry(agent_id.to_string())
            .or_default()
            .push_back(turn);
    }

    /// Turns still queued for an agent.
    pub fn remaining(&self, agent_id: &str) -> usize {
        self.turns.get(agent_id).map(|q| q.len()).unwrap_or(0)
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_for(&self, agent_id: &str) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.agent_id == agent_id)
            .cloned()
            .collect()
    }

    fn next_turn(&self, agent_id: &str) -> Option<ScriptedTurn> {
        self.turns.get_mut(agent_id).and_then(|mut q| q.pop_front())
    }

    fn next_call_id(&self, agent_id: &str) -> String {
        let n = self.next_call.fetch_add(1, Ordering::Relaxed);
        format!("call_{}_{}", agent_id, n)
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn estimate_usage(request: &CompletionRequest, reply_text: &str) -> Usage {
    let prompt_chars: usize = request
        .system
        .iter()
        .map(|s| s.len())
        .chain(request.messages.iter().map(|m| m.content.len()))
        .sum();
    let to_tokens = |chars: usize| u32::try_from(chars / CHARS_PER_TOKEN).unwrap_or(u32::MAX);
    Usage::new(to_tokens(prompt_chars), to_tokens(reply_text.len()))
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let agent_id = request.agent_id.clone();
        let turn = self
            .next_turn(&agent_id)
            .ok_or_else(|| ProviderError::Exhausted(agent_id.clone()))?;
        self.requests.lock().push(request.clone());
        debug!("Scripted turn for agent '{}': {:?}", agent_id, turn.reply);

        if turn.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(turn.delay_ms)).await;
        }

        let (message, stop_reason) = match turn.reply {
            ScriptedReply::Text { text } => (Message::assistant(text), StopReason::EndTurn),
            ScriptedReply::ToolCalls { text, calls } => {
                let calls = calls
                    .into_iter()
                    .map(|c| ToolCall::new(self.next_call_id(&agent_id), c.name, c.arguments))
                    .collect();
                (Message::assistant_with_tools(text, calls), StopReason::ToolUse)
            }
            ScriptedReply::Error { message, retryable } => {
                return Err(if retryable {
                    ProviderError::Network(message)
                } else {
                    ProviderError::InvalidRequest(message)
                });
            }
        };

        let usage = match turn.usage {
            Some(usage) => usage.into(),
            None => estimate_usage(&request, &message.content),
        };

        Ok(CompletionResponse {
            id: format!("resp_{}_{}", agent_id, self.requests.lock().len()),
            model: request.model,
            message,
            stop_reason,
            usage,
        })
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
