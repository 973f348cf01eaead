//! Email drafts and where they are kept.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use tandem_protocols::error::ToolError;
use tandem_protocols::tool::{Tool, ToolContext, ToolDefinition, ToolResult};

/// An email ready to be reviewed and sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl EmailDraft {
    /// Checks the fields a draft cannot do without.
    pub fn check(&self) -> Result<(), String> {
        if !is_address(&self.recipient) {
            return Err(format!("'{}' is not an email address", self.recipient));
        }
        if self.subject.trim().is_empty() {
            return Err("subject must not be empty".to_string());
        }
        if self.body.trim().is_empty() {
            return Err("body must not be empty".to_string());
        }
        Ok(())
    }
}

fn is_address(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// A draft as saved by a [`DraftStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDraft {
    pub id: String,
    #[serde(flatten)]
    pub draft: EmailDraft,
    pub created_at: DateTime<Utc>,
}

/// Persistence for drafts produced by the email agent.
#[cfg_attr(test, mockall::automock)]
pub trait DraftStore: Send + Sync {
    fn save(&self, draft: EmailDraft) -> Result<StoredDraft, ToolError>;

    fn list(&self) -> Vec<StoredDraft>;
}

/// Keeps drafts in memory, oldest first.
#[derive(Debug, Default)]
pub struct InMemoryDraftStore {
    drafts: RwLock<Vec<StoredDraft>>,
}

impl InMemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.drafts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.read().is_empty()
    }
}

impl DraftStore for InMemoryDraftStore {
    fn save(&self, draft: EmailDraft) -> Result<StoredDraft, ToolError> {
        let stored = StoredDraft {
            id: uuid::Uuid::new_v4().to_string(),
            draft,
            created_at: Utc::now(),
        };
        self.drafts.write().push(stored.clone());
        Ok(stored)
    }

    fn list(&self) -> Vec<StoredDraft> {
        self.drafts.read().clone()
    }
}

/// Saves an email draft.
pub struct DraftEmailTool {
    definition: ToolDefinition,
    store: Arc<dyn DraftStore>,
}

impl DraftEmailTool {
    pub fn new(store: Arc<dyn DraftStore>) -> Self {
        let definition = ToolDefinition::new("draft_email", "Draft Email", "Save an email draft for review")
            .with_parameters_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "recipient": {
                        "type": "string",
                        "description": "Email address of the recipient"
                    },
                    "subject": {
                        "type": "string",
                        "description": "Subject line"
                    },
                    "body": {
                        "type": "string",
                        "description": "Plain-text body"
                    }
                },
                "required": ["recipient", "subject", "body"]
            }));

        Self { definition, store }
    }
}

#[async_trait]
impl Tool for DraftEmailTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, params: serde_json::Value, ctx: ToolContext) -> Result<ToolResult, ToolError> {
        let draft: EmailDraft = serde_json::from_value(params)
            .map_err(|e| ToolError::InvalidParameters(e.to_string()))?;
        draft.check().map_err(ToolError::InvalidParameters)?;

        let stored = self.store.save(draft)?;
        info!(
            "Agent '{}' saved draft {} to {}",
            ctx.agent_id, stored.id, stored.draft.recipient
        );
        Ok(ToolResult::json(serde_json::json!({
            "id": stored.id,
            "recipient": stored.draft.recipient,
            "subject": stored.draft.subject,
        })))
    }
}

#[cfg(test)]
#[path = "draft_tests.rs"]
mod tests;
