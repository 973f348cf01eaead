//! A research assistant and its email writer, wired from configuration.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use tandem_config::{Config, ConfigError, ConfigValidator};
use tandem_protocols::agent::Agent;
use tandem_protocols::deps::Dependencies;
use tandem_protocols::error::ToolError;
use tandem_protocols::provider::LLMProvider;
use tandem_protocols::usage::UsageLedger;
use tandem_runtime::{retry_run, RetryConfig, RunHandle, RunReport, RunRequest, Runner};

use crate::draft::{DraftStore, InMemoryDraftStore};
use crate::email::{email_agent, EmailAgent};
use crate::research::{email_delegation, research_agent, ResearchAgent};
use crate::search::{SearchBackend, StaticSearchBackend};

#[derive(Debug, Error)]
pub enum SystemError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to assemble tools: {0}")]
    Tool(#[from] ToolError),

    #[error("No LLM provider configured")]
    MissingProvider,
}

/// The research assistant, ready to take prompts.
pub struct ResearchSystem {
    research: Arc<ResearchAgent>,
    email: Arc<EmailAgent>,
    drafts: Arc<dyn DraftStore>,
    deps: Dependencies,
    runner: Runner,
    retry: RetryConfig,
}

impl ResearchSystem {
    pub fn builder(config: Config) -> ResearchSystemBuilder {
        ResearchSystemBuilder {
            config,
            provider: None,
            search: None,
            drafts: None,
        }
    }

    pub fn research(&self) -> &Arc<ResearchAgent> {
        &self.research
    }

    pub fn email(&self) -> &Arc<EmailAgent> {
        &self.email
    }

    pub fn drafts(&self) -> &Arc<dyn DraftStore> {
        &self.drafts
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// A request carrying the orchestrator's dependency bundle.
    pub fn request(&self, prompt: impl Into<String>) -> RunRequest {
        RunRequest::new(prompt).with_deps(self.deps.clone())
    }

    /// Run a prompt on a fresh ledger, retrying retryable failures.
    pub async fn run(&self, prompt: &str) -> RunReport<String> {
        self.run_on(prompt, Arc::new(UsageLedger::new())).await
    }

    /// Run a prompt on a caller-owned ledger, retrying retryable failures.
    pub async fn run_on(&self, prompt: &str, ledger: Arc<UsageLedger>) -> RunReport<String> {
        let request = self.request(prompt).with_ledger(ledger);
        retry_run(&self.runner, self.research.as_ref(), request, &self.retry).await
    }

    /// Start a single attempt in the background and stream its events.
    pub fn run_stream(&self, prompt: &str) -> RunHandle<String> {
        self.runner.run_stream(Arc::clone(&self.research), self.request(prompt))
    }

    /// Like [`ResearchSystem::run_stream`], charging a caller-owned ledger.
    pub fn run_stream_on(&self, prompt: &str, ledger: Arc<UsageLedger>) -> RunHandle<String> {
        let request = self.request(prompt).with_ledger(ledger);
        self.runner.run_stream(Arc::clone(&self.research), request)
    }
}

/// Builder for [`ResearchSystem`].
pub struct ResearchSystemBuilder {
    config: Config,
    provider: Option<Arc<dyn LLMProvider>>,
    search: Option<Arc<dyn SearchBackend>>,
    drafts: Option<Arc<dyn DraftStore>>,
}

impl ResearchSystemBuilder {
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn search_backend(mut self, backend: Arc<dyn SearchBackend>) -> Self {
        self.search = Some(backend);
        self
    }

    pub fn draft_store(mut self, store: Arc<dyn DraftStore>) -> Self {
        self.drafts = Some(store);
        self
    }

    pub fn build(self) -> Result<ResearchSystem, SystemError> {
        let warnings = ConfigValidator::validate(&self.config).into_result()?;
        for warning in warnings {
            warn!("Config warning at {}: {}", warning.path, warning.message);
        }

        let provider = self.provider.ok_or(SystemError::MissingProvider)?;
        let search: Arc<dyn SearchBackend> = match self.search {
            Some(search) => search,
            None => Arc::new(StaticSearchBackend::sample()),
        };
        let drafts: Arc<dyn DraftStore> = match self.drafts {
            Some(drafts) => drafts,
            None => Arc::new(InMemoryDraftStore::new()),
        };

        let config = self.config;
        let email = Arc::new(email_agent(
            config.delegate.agent.clone(),
            Arc::clone(&provider),
            Arc::clone(&drafts),
        )?);
        let delegation = email_delegation(
            &config.delegation.tool_name,
            Arc::clone(&email),
            config.delegate.dependencies(),
            config.delegation.nested_trace,
        );
        let research = Arc::new(research_agent(
            config.orchestrator.agent.clone(),
            provider,
            search,
            Arc::new(delegation),
        )?);

        let retry = RetryConfig::with_attempts(
            config.runtime.retry.max_attempts,
            Duration::from_millis(config.runtime.retry.initial_delay_ms),
            Duration::from_millis(config.runtime.retry.max_delay_ms),
        );
        info!(
            "Research system ready: '{}' delegates to '{}' via '{}' (max depth {})",
            research.config().id,
            email.config().id,
            config.delegation.tool_name,
            config.runtime.max_depth
        );

        Ok(ResearchSystem {
            research,
            email,
            drafts,
            deps: config.orchestrator.dependencies(),
            runner: Runner::new().with_max_depth(config.runtime.max_depth),
            retry,
        })
    }
}
