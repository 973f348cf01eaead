//! # Tandem Config
//!
//! TOML configuration for the Tandem agents: which agents exist, how deep
//! delegation may nest, and what each agent's dependency bundle holds.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
