//! # Tandem Runtime
//!
//! Runs agents: the generation loop, tool dispatch, agent-to-agent
//! delegation, and the front-end facing runner with live event streams.

pub mod agent;
pub mod bridge;
pub mod retry;
pub mod runner;
pub mod streaming;
pub mod summary;
pub mod toolset;

mod agent_loop;

#[cfg(test)]
mod test_support;

pub use agent::GeneralAgent;
pub use bridge::{Delegation, DelegationOutput, DelegationTool, PromptTemplate};
pub use retry::{retry_run, retry_with, RetryConfig};
pub use runner::{RunOutcome, RunReport, RunRequest, Runner};
pub use streaming::{AgentEventStream, RunHandle};
pub use summary::summarize;
pub use toolset::{ToolBinding, ToolInvocation, ToolSet, ToolSetBuilder};
