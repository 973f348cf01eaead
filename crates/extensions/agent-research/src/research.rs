//! The research orchestrator and its delegation to the email writer.

use std::sync::Arc;

use tandem_protocols::agent::{Agent, AgentConfig, NestedTrace};
use tandem_protocols::deps::Dependencies;
use tandem_protocols::error::ToolError;
use tandem_protocols::provider::LLMProvider;
use tandem_runtime::{Delegation, DelegationTool, GeneralAgent, PromptTemplate, ToolSet};

use crate::search::{SearchBackend, SearchWebTool};

/// Sub-prompt handed to the email writer.
pub const EMAIL_REQUEST_TEMPLATE: &str = "Write an email to {recipient} with the subject \"{subject}\".\n\n\
Base it on the following research:\n{context}";

/// The research assistant: answers in plain text.
pub type ResearchAgent = GeneralAgent<String>;

fn research_system_prompt(delegation_tool: &str) -> String {
    format!(
        "You are a research assistant. Use search_web to gather facts before answering. \
When the user wants the findings sent to someone, call {} with the recipient's address, \
a subject and the findings as context. Finish with a short summary for the user.",
        delegation_tool
    )
}

/// Delegation tool handing email requests to `delegate`.
pub fn email_delegation<A: Agent>(
    tool_name: &str,
    delegate: Arc<A>,
    delegate_deps: Dependencies,
    nested_trace: NestedTrace,
) -> DelegationTool<A> {
    DelegationTool::new(
        tool_name,
        "Ask the email writer to draft an email to a recipient about a subject, \
using the given context",
        delegate,
        PromptTemplate::new(EMAIL_REQUEST_TEMPLATE),
    )
    .with_deps(delegate_deps)
    .with_nested_trace(nested_trace)
}

/// Build the research agent with `search_web` and the given delegation.
pub fn research_agent(
    mut config: AgentConfig,
    provider: Arc<dyn LLMProvider>,
    backend: Arc<dyn SearchBackend>,
    delegation: Arc<dyn Delegation>,
) -> Result<ResearchAgent, ToolError> {
    if config.system_prompt.is_none() {
        config.system_prompt = Some(research_system_prompt(&delegation.definition().id));
    }
    let tools = ToolSet::builder()
        .function(Arc::new(SearchWebTool::new(backend)))
        .delegate(delegation)
        .build()?;
    Ok(GeneralAgent::new(config, provider).with_tools(tools))
}
