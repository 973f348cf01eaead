//! The email-writing delegate.

use std::sync::Arc;

use tandem_protocols::agent::{parse_json_output, AgentConfig, AgentOutput};
use tandem_protocols::error::{AgentError, ProviderError, ToolError};
use tandem_protocols::provider::LLMProvider;
use tandem_runtime::{GeneralAgent, ToolSet, ToolSetBuilder};

use crate::draft::{DraftEmailTool, DraftStore, EmailDraft};

pub const EMAIL_SYSTEM_PROMPT: &str = "You write short, friendly and accurate emails. \
Save the email with the draft_email tool, then reply with only a JSON object \
of the form {\"recipient\": ..., \"subject\": ..., \"body\": ...}.";

/// The email writer: plans with a provider and answers with an [`EmailDraft`].
pub type EmailAgent = GeneralAgent<EmailDraft>;

impl AgentOutput for EmailDraft {
    fn from_final_text(text: &str) -> Result<Self, AgentError> {
        let draft: EmailDraft = parse_json_output(text)?;
        draft.check().map_err(|reason| {
            AgentError::GenerationFailure(ProviderError::InvalidResponse(format!(
                "email draft rejected: {}",
                reason
            )))
        })?;
        Ok(draft)
    }

    fn to_tool_output(&self) -> serde_json::Value {
        serde_json::json!({
            "recipient": self.recipient,
            "subject": self.subject,
            "body": self.body,
        })
    }

    fn summary(&self) -> String {
        format!("Draft to {}: {}", self.recipient, self.subject)
    }
}

/// Tools every email agent gets. More can be added before building.
pub fn email_toolset(store: Arc<dyn DraftStore>) -> ToolSetBuilder {
    ToolSet::builder().function(Arc::new(DraftEmailTool::new(store)))
}

/// Build an email agent over a finished tool set.
pub fn email_agent_with_tools(
    mut config: AgentConfig,
    provider: Arc<dyn LLMProvider>,
    tools: ToolSet,
) -> EmailAgent {
    if config.system_prompt.is_none() {
        config.system_prompt = Some(EMAIL_SYSTEM_PROMPT.to_string());
    }
    GeneralAgent::new(config, provider).with_tools(tools)
}

/// Build the standard email agent: `draft_email` and nothing else.
pub fn email_agent(
    config: AgentConfig,
    provider: Arc<dyn LLMProvider>,
    store: Arc<dyn DraftStore>,
) -> Result<EmailAgent, ToolError> {
    let tools = email_toolset(store).build()?;
    Ok(email_agent_with_tools(config, provider, tools))
}
