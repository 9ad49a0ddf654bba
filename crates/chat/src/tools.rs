//! Tools the model may call during answer synthesis.

use crate::web_search::SearchProvider;
use async_trait::async_trait;
use pathway_core::{AppError, AppResult};
use pathway_knowledge::Retriever;
use pathway_llm::ToolSchema;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub const DOCUMENT_RETRIEVER_TOOL: &str = "document_retriever";
pub const WEB_SEARCH_TOOL: &str = "web_search";

/// A callable tool exposed to the LLM.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn schema(&self) -> ToolSchema;
    async fn execute(&self, arguments: &Value) -> AppResult<String>;
}

/// Named tool lookup; iteration order is not meaningful.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn query_argument(arguments: &Value) -> AppResult<&str> {
    arguments
        .get("query")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Validation("Missing 'query' argument".to_string()))
}

/// Searches the policy corpus. Zero hits produce the retrieval sentinel,
/// never an error.
pub struct DocumentRetrieverTool {
    retriever: Arc<Retriever>,
}

impl DocumentRetrieverTool {
    pub fn new(retriever: Arc<Retriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for DocumentRetrieverTool {
    fn name(&self) -> &str {
        DOCUMENT_RETRIEVER_TOOL
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: DOCUMENT_RETRIEVER_TOOL.to_string(),
            description: "Search the policy document corpus for passages relevant to a query. \
                 Returns cited passages, or DOCUMENT_SEARCH_FAILED when nothing matches."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, arguments: &Value) -> AppResult<String> {
        let query = query_argument(arguments)?;
        Ok(self.retriever.retrieve_text(query).await)
    }
}

/// Searches the public web for live information.
pub struct WebSearchTool {
    provider: Arc<dyn SearchProvider>,
}

impl WebSearchTool {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        WEB_SEARCH_TOOL
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: WEB_SEARCH_TOOL.to_string(),
            description: "Search the public web for current information that is not in the \
                 policy corpus, such as service status or recent changes."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, arguments: &Value) -> AppResult<String> {
        let query = query_argument(arguments)?;
        self.provider.search(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathway_knowledge::{EmbeddingIndex, DOCUMENT_SEARCH_FAILED};
    use pathway_knowledge::embeddings::providers::trigram::TrigramProvider;

    fn empty_retriever() -> Arc<Retriever> {
        let index = Arc::new(EmbeddingIndex::new(Arc::new(TrigramProvider::new(64))));
        Arc::new(Retriever::new(index, 4))
    }

    #[tokio::test]
    async fn test_retriever_tool_returns_sentinel_not_error() {
        let tool = DocumentRetrieverTool::new(empty_retriever());
        let output = tool
            .execute(&json!({ "query": "anything" }))
            .await
            .unwrap();
        assert_eq!(output, DOCUMENT_SEARCH_FAILED);
    }

    #[tokio::test]
    async fn test_missing_query_argument_is_an_error() {
        let tool = DocumentRetrieverTool::new(empty_retriever());
        assert!(tool.execute(&json!({})).await.is_err());
    }

    #[test]
    fn test_registry_lookup_and_schemas() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(DocumentRetrieverTool::new(empty_retriever())));

        assert!(registry.get(DOCUMENT_RETRIEVER_TOOL).is_some());
        assert!(registry.get("no_such_tool").is_none());
        assert_eq!(registry.schemas().len(), 1);
    }
}
