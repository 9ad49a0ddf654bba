//! Retrieval tool: policy wrapper over the embedding index.
//!
//! Produces either formatted, cited passages or a fixed failure sentinel.
//! The sentinel is a machine-readable contract consumed by the
//! orchestrator's routing logic; it is deliberately not natural-language
//! text, so "no answer found" never gets confused with a model-generated
//! refusal.

use crate::index::EmbeddingIndex;
use std::sync::Arc;

/// Fixed sentinel returned when retrieval finds no matching documents.
pub const DOCUMENT_SEARCH_FAILED: &str = "DOCUMENT_SEARCH_FAILED";

/// Result of one retrieval: formatted passage text plus the distinct
/// document ids cited, in rank order.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub text: String,
    pub sources: Vec<String>,
}

impl RetrievalOutcome {
    pub fn is_sentinel(&self) -> bool {
        self.text == DOCUMENT_SEARCH_FAILED
    }
}

/// Thin retrieval policy over a shared, read-only index.
pub struct Retriever {
    index: Arc<EmbeddingIndex>,
    top_k: usize,
}

impl Retriever {
    pub fn new(index: Arc<EmbeddingIndex>, top_k: usize) -> Self {
        Self { index, top_k }
    }

    /// Retrieve passages relevant to `query`.
    ///
    /// Zero hits yield the failure sentinel; hits are formatted as cited
    /// passages in rank order. Index failures are converted to a textual
    /// error result and never raised out of this boundary.
    pub async fn retrieve(&self, query: &str) -> RetrievalOutcome {
        tracing::info!("Retrieving documents for query: {}", query);

        match self.index.query(query, self.top_k).await {
            Ok(hits) if hits.is_empty() => {
                tracing::info!("No documents matched; returning failure sentinel");
                RetrievalOutcome {
                    text: DOCUMENT_SEARCH_FAILED.to_string(),
                    sources: Vec::new(),
                }
            }
            Ok(hits) => {
                let mut sources: Vec<String> = Vec::new();
                let text = hits
                    .iter()
                    .enumerate()
                    .map(|(i, (chunk, score))| {
                        tracing::debug!("Hit {}: {} (score {:.3})", i + 1, chunk.id, score);
                        if !sources.contains(&chunk.document_id) {
                            sources.push(chunk.document_id.clone());
                        }
                        format!("[Source {} - {}]: {}", i + 1, chunk.document_id, chunk.text)
                    })
                    .collect::<Vec<_>>()
                    .join("\n\n");
                RetrievalOutcome { text, sources }
            }
            Err(e) => {
                tracing::error!("Retrieval failed: {}", e);
                RetrievalOutcome {
                    text: format!("Error retrieving documents: {}", e),
                    sources: Vec::new(),
                }
            }
        }
    }

    /// Retrieve and return only the formatted passage text.
    pub async fn retrieve_text(&self, query: &str) -> String {
        self.retrieve(query).await.text
    }
}
