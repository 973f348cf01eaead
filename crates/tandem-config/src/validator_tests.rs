use super::*;
use tandem_protocols::AgentConfig;

#[test]
fn test_validate_default_config() {
    let result = ConfigValidator::validate(&Config::default());
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_zero_max_depth() {
    let mut config = Config::default();
    config.runtime.max_depth = 0;

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "runtime.max_depth"));
}

#[test]
fn test_validate_high_max_depth_warning() {
    let mut config = Config::default();
    config.runtime.max_depth = 20;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "runtime.max_depth"));
}

#[test]
fn test_validate_zero_retry_attempts() {
    let mut config = Config::default();
    config.runtime.retry.max_attempts = 0;

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "runtime.retry.max_attempts"));
}

#[test]
fn test_validate_retry_delay_warning() {
    let mut config = Config::default();
    config.runtime.retry.initial_delay_ms = 20_000;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_validate_empty_agent_id() {
    let mut config = Config::default();
    config.delegate.agent.id = "  ".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "delegate.id"));
}

#[test]
fn test_validate_empty_model() {
    let mut config = Config::default();
    config.orchestrator.agent.model = String::new();

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "orchestrator.model"));
}

#[test]
fn test_validate_zero_max_turns() {
    let mut config = Config::default();
    config.orchestrator.agent.max_turns = 0;

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "orchestrator.max_turns"));
}

#[test]
fn test_validate_small_summary_warning() {
    let mut config = Config::default();
    config.delegate.agent.summary_max_chars = 8;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "delegate.summary_max_chars"));
}

#[test]
fn test_validate_same_ids() {
    let mut config = Config::default();
    config.delegate = AgentProfile::new(AgentConfig::new("research", "Clone", "stub-model"));

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "delegate.id"));
}

#[test]
fn test_validate_empty_tool_name() {
    let mut config = Config::default();
    config.delegation.tool_name = String::new();

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "delegation.tool_name"));
}

#[test]
fn test_into_result() {
    let ok = ConfigValidator::validate(&Config::default()).into_result();
    assert!(ok.unwrap().is_empty());

    let mut config = Config::default();
    config.runtime.max_depth = 0;
    let err = ConfigValidator::validate(&config).into_result().unwrap_err();
    assert!(err.to_string().contains("runtime.max_depth"));
}
