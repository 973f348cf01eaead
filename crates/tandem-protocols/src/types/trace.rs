//! Tool-call trace records.

use serde::{Deserialize, Serialize};

/// Outcome of a single tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Succeeded,
    Failed,
}

/// One entry in a run's tool-call trace.
///
/// Exactly one record is appended per invocation, whether the tool was a
/// plain function or a delegation to another agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Provider-assigned call ID.
    pub call_id: String,

    /// Name of the tool that was invoked.
    pub tool_name: String,

    /// Arguments as passed by the model.
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,

    /// Bounded digest of the result (or of the error for failed calls).
    pub result_summary: String,

    pub status: ToolCallStatus,

    /// Whether the call was routed to another agent.
    #[serde(default)]
    pub delegated: bool,

    /// Wall-clock duration of the call.
    #[serde(default)]
    pub duration_ms: u64,

    /// The delegate's own trace, when the bridge attaches it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<Vec<ToolCallRecord>>,
}

impl ToolCallRecord {
    pub fn succeeded(&self) -> bool {
        self.status == ToolCallStatus::Succeeded
    }

    /// Normalizes model-supplied arguments into a map. Non-object values are
    /// kept under a single `value` key so nothing is dropped from the trace.
    pub fn arguments_map(arguments: &serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match arguments {
            serde_json::Value::Object(map) => map.clone(),
            serde_json::Value::Null => serde_json::Map::new(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("value".to_string(), other.clone());
                map
            }
        }
    }
}
