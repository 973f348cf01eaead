//! # Tandem Protocols
//!
//! Core protocol definitions (traits and shared types) for the Tandem
//! delegation core. Implementations live in `tandem-runtime` and the
//! extension crates.
//!
//! ## Core Traits
//!
//! - [`Agent`] - A unit of work turning a prompt into a typed [`AgentResult`]
//! - [`Tool`] - A plain function capability an agent may invoke
//! - [`LLMProvider`] - The generation step, supplied by an external client
//!
//! ## Shared State
//!
//! - [`UsageLedger`] - Resource accounting shared across a whole call tree
//! - [`Dependencies`] - Read-only per-agent dependency bundle
//! - [`EventSink`] - Channel the front-end observes a run through

pub mod agent;
pub mod deps;
pub mod error;
pub mod event;
pub mod provider;
pub mod tool;
pub mod types;
pub mod usage;

pub use agent::{
    parse_json_output, Agent, AgentConfig, AgentOutput, AgentResult, Degradation, FailurePolicy,
    NestedTrace, RunContext, RunState, DEFAULT_MAX_DEPTH,
};
pub use deps::Dependencies;
pub use error::{AgentError, ProviderError, ToolError};
pub use event::{EventSink, StreamEvent};
pub use provider::{CompletionRequest, CompletionResponse, LLMProvider};
pub use tool::{AbortSignal, Tool, ToolContext, ToolDefinition, ToolResult};
pub use types::{Message, MessageRole, StopReason, ToolCall, ToolCallRecord, ToolCallStatus, Usage};
pub use usage::{LedgerOverflow, UsageLedger, UsageSnapshot};
