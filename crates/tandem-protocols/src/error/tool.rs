//! Tool execution errors.

use thiserror::Error;

use super::AgentError;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Delegation to agent '{agent}' failed: {cause}")]
    DelegationFailed {
        agent: String,
        #[source]
        cause: Box<AgentError>,
    },

    #[error("Tool execution was cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_not_found() {
        let err = ToolError::NotFound("test_tool".to_string());
        assert!(err.to_string().contains("Tool not found"));
        assert!(err.to_string().contains("test_tool"));
    }

    #[test]
    fn test_tool_error_already_registered() {
        let err = ToolError::AlreadyRegistered("search_web".to_string());
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn test_tool_error_invalid_parameters() {
        let err = ToolError::InvalidParameters("missing field".to_string());
        assert!(err.to_string().contains("Invalid parameters"));
    }

    #[test]
    fn test_tool_error_execution_failed() {
        let err = ToolError::ExecutionFailed("Something went wrong".to_string());
        assert!(err.to_string().contains("execution failed"));
    }

    #[test]
    fn test_tool_error_delegation_failed() {
        let err = ToolError::DelegationFailed {
            agent: "email".to_string(),
            cause: Box::new(AgentError::Cancelled),
        };
        assert!(err.to_string().contains("'email'"));
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn test_tool_error_cancelled() {
        let err = ToolError::Cancelled;
        assert!(err.to_string().contains("cancelled"));
    }
}
