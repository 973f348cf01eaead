//! Run events observed by front-ends.
//!
//! Every agent in a call tree emits into the same [`EventSink`]; the `depth`
//! field tells the observer whether an event came from the top-level agent
//! or from a delegate.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::agent::{Degradation, RunState};
use crate::types::ToolCallRecord;
use crate::usage::UsageSnapshot;

/// Event emitted while a run progresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    RunStarted {
        run_id: String,
        agent_id: String,
        depth: u32,
    },
    StateChanged {
        agent_id: String,
        depth: u32,
        state: RunState,
    },
    /// Text produced by the model during a turn.
    TextDelta {
        agent_id: String,
        depth: u32,
        content: String,
    },
    ToolCallStart {
        agent_id: String,
        depth: u32,
        call_id: String,
        tool_name: String,
        arguments: serde_json::Value,
        delegated: bool,
    },
    ToolCallComplete {
        agent_id: String,
        depth: u32,
        record: ToolCallRecord,
    },
    /// A delegate failed and the calling agent carried on without it.
    Degraded {
        agent_id: String,
        depth: u32,
        degradation: Degradation,
    },
    RunFinished {
        run_id: String,
        agent_id: String,
        depth: u32,
        usage: UsageSnapshot,
    },
    RunFailed {
        run_id: String,
        agent_id: String,
        depth: u32,
        error: String,
    },
}

impl StreamEvent {
    /// Delegation depth of the agent that emitted the event.
    pub fn depth(&self) -> u32 {
        match self {
            StreamEvent::RunStarted { depth, .. }
            | StreamEvent::StateChanged { depth, .. }
            | StreamEvent::TextDelta { depth, .. }
            | StreamEvent::ToolCallStart { depth, .. }
            | StreamEvent::ToolCallComplete { depth, .. }
            | StreamEvent::Degraded { depth, .. }
            | StreamEvent::RunFinished { depth, .. }
            | StreamEvent::RunFailed { depth, .. } => *depth,
        }
    }

    pub fn agent_id(&self) -> &str {
        match self {
            StreamEvent::RunStarted { agent_id, .. }
            | StreamEvent::StateChanged { agent_id, .. }
            | StreamEvent::TextDelta { agent_id, .. }
            | StreamEvent::ToolCallStart { agent_id, .. }
            | StreamEvent::ToolCallComplete { agent_id, .. }
            | StreamEvent::Degraded { agent_id, .. }
            | StreamEvent::RunFinished { agent_id, .. }
            | StreamEvent::RunFailed { agent_id, .. } => agent_id,
        }
    }

    /// True for the event that ends a run at the given depth.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::RunFinished { .. } | StreamEvent::RunFailed { .. }
        )
    }
}

/// Sending half of a run's event channel.
///
/// A default sink is disabled and drops everything. Emitting never fails:
/// a closed receiver only means nobody is watching anymore.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<StreamEvent>>,
}

impl EventSink {
    /// A sink that drops every event.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// A connected sink and its receiver.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    pub fn emit(&self, event: StreamEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
