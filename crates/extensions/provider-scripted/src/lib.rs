//! Scripted LLM provider for Tandem.
//!
//! Replays pre-recorded turns per agent id. Used by the end-to-end tests
//! and by the CLI when no hosted model is wired in.

mod provider;
mod script;

pub use provider::ScriptedProvider;
pub use script::{Script, ScriptError, ScriptedCall, ScriptedReply, ScriptedTurn, ScriptedUsage};
