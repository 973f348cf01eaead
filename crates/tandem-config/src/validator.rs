//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::{AgentProfile, Config};

/// Summaries shorter than this carry almost no information.
const MIN_USEFUL_SUMMARY_CHARS: usize = 16;

/// Depths beyond this are allowed but unusual.
const HIGH_MAX_DEPTH: u32 = 8;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_runtime(config, &mut result);
        Self::validate_profile("orchestrator", &config.orchestrator, &mut result);
        Self::validate_profile("delegate", &config.delegate, &mut result);
        Self::validate_delegation(config, &mut result);

        result
    }

    fn validate_runtime(config: &Config, result: &mut ValidationResult) {
        let runtime = &config.runtime;
        if runtime.max_depth == 0 {
            result.add_error(ValidationError::new(
                "runtime.max_depth",
                "max_depth must be at least 1 for the delegate to run",
            ));
        }

        if runtime.max_depth > HIGH_MAX_DEPTH {
            result.add_warning(ValidationWarning::new(
                "runtime.max_depth",
                format!("max_depth is very high (>{})", HIGH_MAX_DEPTH),
            ));
        }

        if runtime.retry.max_attempts == 0 {
            result.add_error(ValidationError::new(
                "runtime.retry.max_attempts",
                "max_attempts must be greater than 0",
            ));
        }

        if runtime.retry.initial_delay_ms > runtime.retry.max_delay_ms {
            result.add_warning(ValidationWarning::new(
                "runtime.retry.initial_delay_ms",
                "initial_delay_ms exceeds max_delay_ms and will be clamped",
            ));
        }
    }

    fn validate_profile(section: &str, profile: &AgentProfile, result: &mut ValidationResult) {
        let agent = &profile.agent;
        if agent.id.trim().is_empty() {
            result.add_error(ValidationError::new(
                format!("{}.id", section),
                "Agent id cannot be empty",
            ));
        }

        if agent.model.trim().is_empty() {
            result.add_error(ValidationError::new(
                format!("{}.model", section),
                "Model cannot be empty",
            ));
        }

        if agent.max_turns == 0 {
            result.add_error(ValidationError::new(
                format!("{}.max_turns", section),
                "max_turns must be greater than 0",
            ));
        }

        if agent.summary_max_chars < MIN_USEFUL_SUMMARY_CHARS {
            result.add_warning(ValidationWarning::new(
                format!("{}.summary_max_chars", section),
                format!(
                    "summary_max_chars below {} makes tool-call traces hard to read",
                    MIN_USEFUL_SUMMARY_CHARS
                ),
            ));
        }
    }

    fn validate_delegation(config: &Config, result: &mut ValidationResult) {
        if config.orchestrator.agent.id == config.delegate.agent.id {
            result.add_error(ValidationError::new(
                "delegate.id",
                "Delegate must have a different id than the orchestrator",
            ));
        }

        if config.delegation.tool_name.trim().is_empty() {
            result.add_error(ValidationError::new(
                "delegation.tool_name",
                "Delegation tool name cannot be empty",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
