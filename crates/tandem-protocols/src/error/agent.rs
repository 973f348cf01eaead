//! Agent errors.

use thiserror::Error;

use super::ProviderError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Generation failed: {0}")]
    GenerationFailure(#[from] ProviderError),

    #[error("Delegation via '{tool}' failed: {cause}")]
    DelegationFailure {
        tool: String,
        #[source]
        cause: Box<AgentError>,
    },

    #[error("Delegation depth {depth} exceeds the maximum of {max}")]
    DelegationDepthExceeded { depth: u32, max: u32 },

    #[error("Max turns exceeded: {0}")]
    MaxTurnsExceeded(u32),

    #[error("Run was cancelled")]
    Cancelled,
}

impl AgentError {
    /// Whether the caller may reasonably retry the run.
    ///
    /// Only generation failures are transient. A delegation failure is
    /// retryable when its root cause is.
    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::GenerationFailure(_) => true,
            AgentError::DelegationFailure { cause, .. } => cause.is_retryable(),
            _ => false,
        }
    }

    /// Follow `DelegationFailure` causes down to the innermost error.
    pub fn root_cause(&self) -> &AgentError {
        match self {
            AgentError::DelegationFailure { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}
