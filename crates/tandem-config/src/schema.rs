//! Configuration schema definitions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tandem_protocols::{AgentConfig, Dependencies, NestedTrace, DEFAULT_MAX_DEPTH};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default = "AgentProfile::default_orchestrator")]
    pub orchestrator: AgentProfile,

    #[serde(default = "AgentProfile::default_delegate")]
    pub delegate: AgentProfile,

    #[serde(default)]
    pub delegation: DelegationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig::default(),
            orchestrator: AgentProfile::default_orchestrator(),
            delegate: AgentProfile::default_delegate(),
            delegation: DelegationConfig::default(),
        }
    }
}

/// Runtime limits applying to every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Deepest delegation level allowed; the orchestrator runs at depth 0.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    #[serde(default)]
    pub retry: RetrySettings,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            retry: RetrySettings::default(),
        }
    }
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

/// Caller-side retry of whole top-level runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    1
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}

/// One agent's settings plus its dependency bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    #[serde(flatten)]
    pub agent: AgentConfig,

    /// Values handed to this agent's tools and provider.
    #[serde(default)]
    pub deps: HashMap<String, serde_json::Value>,
}

impl AgentProfile {
    pub fn new(agent: AgentConfig) -> Self {
        Self {
            agent,
            deps: HashMap::new(),
        }
    }

    pub fn default_orchestrator() -> Self {
        Self::new(
            AgentConfig::new("research", "Research Assistant", "stub-model")
                .with_description("Answers research questions and drafts follow-up emails"),
        )
    }

    pub fn default_delegate() -> Self {
        Self::new(
            AgentConfig::new("email", "Email Writer", "stub-model")
                .with_description("Drafts an email from a recipient, subject and context"),
        )
    }

    /// The profile's dependency bundle.
    pub fn dependencies(&self) -> Dependencies {
        Dependencies::from_map(self.deps.clone())
    }
}

/// How the orchestrator reaches its delegate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationConfig {
    /// Tool name the orchestrator's model calls to delegate.
    #[serde(default = "default_tool_name")]
    pub tool_name: String,

    #[serde(default)]
    pub nested_trace: NestedTrace,
}

impl Default for DelegationConfig {
    fn default() -> Self {
        Self {
            tool_name: default_tool_name(),
            nested_trace: NestedTrace::default(),
        }
    }
}

fn default_tool_name() -> String {
    "create_email_draft".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
