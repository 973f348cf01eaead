//! Entry point for top-level runs.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;

use tandem_protocols::agent::{Agent, AgentResult, RunContext, DEFAULT_MAX_DEPTH};
use tandem_protocols::deps::Dependencies;
use tandem_protocols::error::AgentError;
use tandem_protocols::event::{EventSink, StreamEvent};
use tandem_protocols::tool::AbortSignal;
use tandem_protocols::types::ToolCallRecord;
use tandem_protocols::usage::{LedgerOverflow, UsageLedger, UsageSnapshot};

use crate::streaming::{AgentEventStream, RunHandle};

/// A request for one top-level run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub prompt: String,
    /// The top-level agent's dependency bundle.
    pub deps: Dependencies,
    /// Ledger to charge; a fresh one is created when absent.
    pub ledger: Option<Arc<UsageLedger>>,
}

impl RunRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            deps: Dependencies::new(),
            ledger: None,
        }
    }

    pub fn with_deps(mut self, deps: Dependencies) -> Self {
        self.deps = deps;
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<UsageLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }
}

/// How a top-level run ended, from the front-end's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    /// Completed, but at least one delegate failed along the way.
    Degraded,
    Failed,
}

/// Everything the front-end needs once a run is over.
#[derive(Debug)]
pub struct RunReport<T> {
    pub outcome: Result<AgentResult<T>, AgentError>,
    /// The top-level agent's trace, also available when the run failed.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Ledger totals after the run.
    pub usage: UsageSnapshot,
}

impl<T> RunReport<T> {
    pub fn kind(&self) -> RunOutcome {
        match &self.outcome {
            Ok(result) if result.is_degraded() => RunOutcome::Degraded,
            Ok(_) => RunOutcome::Completed,
            Err(_) => RunOutcome::Failed,
        }
    }

    pub fn overflow(&self) -> Option<LedgerOverflow> {
        self.usage.overflow()
    }
}

/// Issues top-level runs.
#[derive(Debug, Clone)]
pub struct Runner {
    max_depth: u32,
}

impl Runner {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Run an agent to completion.
    pub async fn run<A: Agent>(&self, agent: &A, request: RunRequest) -> RunReport<A::Output> {
        let abort_signal = Arc::new(AbortSignal::new());
        execute(agent, request, self.max_depth, abort_signal, EventSink::disabled()).await
    }

    /// Start a run in the background and observe it live.
    pub fn run_stream<A: Agent + 'static>(
        &self,
        agent: Arc<A>,
        request: RunRequest,
    ) -> RunHandle<A::Output> {
        let (events, receiver) = EventSink::channel();
        let abort_signal = Arc::new(AbortSignal::new());
        let max_depth = self.max_depth;
        let task_signal = Arc::clone(&abort_signal);
        let task = tokio::spawn(async move {
            execute(agent.as_ref(), request, max_depth, task_signal, events).await
        });
        RunHandle::new(AgentEventStream::new(receiver), abort_signal, task)
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

async fn execute<A: Agent>(
    agent: &A,
    request: RunRequest,
    max_depth: u32,
    abort_signal: Arc<AbortSignal>,
    forward: EventSink,
) -> RunReport<A::Output> {
    let ledger = request
        .ledger
        .unwrap_or_else(|| Arc::new(UsageLedger::new()));
    let (events, receiver) = EventSink::channel();
    let ctx = RunContext::new(request.deps, Arc::clone(&ledger))
        .with_max_depth(max_depth)
        .with_abort_signal(abort_signal)
        .with_events(events);
    info!("Starting top-level run {} with agent '{}'", ctx.run_id, agent.id());

    // The context owns the only sender, so the trace collector finishes
    // once the run and every sub-run have dropped theirs.
    let (outcome, trace) = tokio::join!(
        agent.run(&request.prompt, ctx),
        collect_trace(receiver, forward)
    );

    let tool_calls = match &outcome {
        Ok(result) => result.tool_calls.clone(),
        Err(_) => trace,
    };
    RunReport {
        outcome,
        tool_calls,
        usage: ledger.snapshot(),
    }
}

/// Forward every event and keep the top-level agent's tool-call records.
async fn collect_trace(
    mut receiver: mpsc::UnboundedReceiver<StreamEvent>,
    forward: EventSink,
) -> Vec<ToolCallRecord> {
    let mut trace = Vec::new();
    while let Some(event) = receiver.recv().await {
        if let StreamEvent::ToolCallComplete { depth: 0, record, .. } = &event {
            trace.push(record.clone());
        }
        forward.emit(event);
    }
    trace
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
