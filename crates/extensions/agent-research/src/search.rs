//! Web search tool and the backends it queries.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tandem_protocols::error::ToolError;
use tandem_protocols::tool::{Tool, ToolContext, ToolDefinition, ToolResult};

/// Dependency key capping how many results a single search may return.
pub const MAX_RESULTS_KEY: &str = "search.max_results";

/// A search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl SearchHit {
    pub fn new(title: impl Into<String>, url: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}

/// Where `search_web` gets its results from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ToolError>;
}

/// Backend over a fixed corpus, matching on query terms.
///
/// Hits are ranked by how many distinct query terms appear in the title or
/// snippet; ties keep corpus order.
#[derive(Debug, Clone, Default)]
pub struct StaticSearchBackend {
    corpus: Vec<SearchHit>,
}

impl StaticSearchBackend {
    pub fn new(corpus: Vec<SearchHit>) -> Self {
        Self { corpus }
    }

    /// A handful of documents about Rust, enough for demos.
    pub fn sample() -> Self {
        Self::new(vec![
            SearchHit::new(
                "The Rust Programming Language",
                "https://doc.rust-lang.org/book/",
                "An introductory book about Rust covering ownership, borrowing and lifetimes.",
            ),
            SearchHit::new(
                "Asynchronous Programming in Rust",
                "https://rust-lang.github.io/async-book/",
                "How async/await works in Rust and how executors such as Tokio drive futures.",
            ),
            SearchHit::new(
                "Tokio tutorial",
                "https://tokio.rs/tokio/tutorial",
                "Build a networked application with the Tokio async runtime.",
            ),
            SearchHit::new(
                "Rust 2024 edition guide",
                "https://doc.rust-lang.org/edition-guide/rust-2024/",
                "Changes that come with the Rust 2024 edition.",
            ),
        ])
    }

    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }
}

#[async_trait]
impl SearchBackend for StaticSearchBackend {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ToolError> {
        let mut terms: Vec<String> = query
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();
        terms.sort();
        terms.dedup();

        let mut scored: Vec<(usize, &SearchHit)> = self
            .corpus
            .iter()
            .filter_map(|hit| {
                let haystack = format!("{} {}", hit.title, hit.snippet).to_lowercase();
                let score = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
                (score > 0).then_some((score, hit))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored.into_iter().take(limit).map(|(_, hit)| hit.clone()).collect())
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
    #[serde(default = "default_count")]
    count: usize,
}

fn default_count() -> usize {
    5
}

/// Searches the web for a query.
pub struct SearchWebTool {
    definition: ToolDefinition,
    backend: Arc<dyn SearchBackend>,
}

impl SearchWebTool {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        let definition = ToolDefinition::new("search_web", "Web Search", "Search the web for information")
            .with_parameters_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    },
                    "count": {
                        "type": "integer",
                        "description": "Maximum number of results to return",
                        "default": default_count()
                    }
                },
                "required": ["query"]
            }));

        Self { definition, backend }
    }
}

#[async_trait]
impl Tool for SearchWebTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, params: serde_json::Value, ctx: ToolContext) -> Result<ToolResult, ToolError> {
        let params: SearchParams = serde_json::from_value(params)
            .map_err(|e| ToolError::InvalidParameters(e.to_string()))?;

        if params.query.trim().is_empty() {
            return Err(ToolError::InvalidParameters("Query cannot be empty".to_string()));
        }

        let limit = match ctx.deps().get::<usize>(MAX_RESULTS_KEY) {
            Some(cap) => params.count.min(cap),
            None => params.count,
        };
        debug!("search_web '{}' (limit {})", params.query, limit);

        let results = self.backend.search(&params.query, limit).await?;
        let output = serde_json::json!({
            "query": params.query,
            "results": results,
            "count": results.len()
        });
        Ok(ToolResult::json(output))
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
