//! Tool execution context and cancellation.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::agent::RunContext;
use crate::deps::Dependencies;
use crate::usage::UsageLedger;

/// Context handed to a tool for one invocation.
///
/// It wraps the calling agent's [`RunContext`], so a tool sees the same
/// ledger, dependency bundle and abort signal as the run that invoked it.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Provider-assigned call ID.
    pub call_id: String,

    /// ID of the agent that invoked the tool.
    pub agent_id: String,

    run: RunContext,
}

impl ToolContext {
    /// Context for one call made by `agent_id` within `run`.
    pub fn for_call(run: &RunContext, agent_id: impl Into<String>, call_id: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            agent_id: agent_id.into(),
            run: run.clone(),
        }
    }

    /// Context outside any agent run, with a fresh ledger.
    pub fn detached(deps: Dependencies) -> Self {
        let run = RunContext::new(deps, Arc::new(UsageLedger::new()));
        Self::for_call(&run, "detached", uuid::Uuid::new_v4().to_string())
    }

    /// The calling agent's dependency bundle.
    pub fn deps(&self) -> &Dependencies {
        &self.run.deps
    }

    /// The ledger shared by the whole call tree.
    pub fn ledger(&self) -> &Arc<UsageLedger> {
        &self.run.ledger
    }

    /// Delegation depth of the calling run (0 for a top-level run).
    pub fn depth(&self) -> u32 {
        self.run.depth
    }

    pub fn run_id(&self) -> &str {
        &self.run.run_id
    }

    pub fn abort_signal(&self) -> &Arc<AbortSignal> {
        &self.run.abort_signal
    }

    /// Check if the operation should be aborted.
    pub fn is_aborted(&self) -> bool {
        self.run.abort_signal.is_aborted()
    }

    /// Run context for a delegated sub-run: same ledger, one level deeper,
    /// abort signal derived from the caller's.
    pub fn delegated_run(&self, deps: Dependencies) -> RunContext {
        self.run.delegated(deps)
    }
}

/// Signal for aborting a run and everything nested under it.
///
/// Aborting a signal also aborts every signal derived from it with
/// [`AbortSignal::child`]; aborting a child leaves the parent untouched.
#[derive(Debug, Default)]
pub struct AbortSignal {
    token: CancellationToken,
}

impl AbortSignal {
    /// Create a new abort signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if aborted.
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Trigger the abort.
    pub fn abort(&self) {
        self.token.cancel();
    }

    /// A signal that is aborted whenever this one is.
    pub fn child(&self) -> AbortSignal {
        AbortSignal {
            token: self.token.child_token(),
        }
    }

    /// Completes once the signal is aborted.
    pub async fn aborted(&self) {
        self.token.cancelled().await
    }
}
