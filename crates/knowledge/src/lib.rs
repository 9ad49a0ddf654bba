//! Document ingestion, chunking, embedding and retrieval.
//!
//! The build pipeline is: documents → chunks → vectors → index, run once at
//! startup. At query time the index is read-only and shared across
//! sessions.

pub mod chunker;
pub mod embeddings;
pub mod index;
pub mod ingest;
pub mod retriever;
pub mod types;

// Re-export commonly used types
pub use index::EmbeddingIndex;
pub use retriever::{RetrievalOutcome, Retriever, DOCUMENT_SEARCH_FAILED};
pub use types::{Chunk, Document, SnapshotRecord};

use embeddings::EmbeddingProvider;
use pathway_core::AppResult;
use std::path::Path;
use std::sync::Arc;

/// Build an index from a corpus directory: ingest, chunk, embed, insert.
///
/// Missing corpora produce an empty (but valid) index; embedding failures
/// are fatal.
pub async fn build_index(
    corpus_path: &Path,
    chunk_size: usize,
    chunk_overlap: usize,
    provider: Arc<dyn EmbeddingProvider>,
) -> AppResult<EmbeddingIndex> {
    let documents = ingest::ingest(corpus_path)?;
    index_documents(&documents, chunk_size, chunk_overlap, provider).await
}

/// Chunk and embed already-ingested documents into a fresh index.
pub async fn index_documents(
    documents: &[Document],
    chunk_size: usize,
    chunk_overlap: usize,
    provider: Arc<dyn EmbeddingProvider>,
) -> AppResult<EmbeddingIndex> {
    let chunks = chunker::chunk_corpus(documents, chunk_size, chunk_overlap);

    tracing::info!(
        "Indexing {} chunks from {} documents",
        chunks.len(),
        documents.len()
    );

    let mut index = EmbeddingIndex::new(provider);
    index.insert(&chunks).await?;
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::trigram::TrigramProvider;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_build_index_from_corpus() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("guide.txt"),
            "Proof of identity requires a certified passport copy.",
        )
        .unwrap();

        let index = build_index(temp.path(), 100, 20, Arc::new(TrigramProvider::new(64)))
            .await
            .unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.document_count(), 1);
    }

    #[tokio::test]
    async fn test_build_index_missing_corpus_is_empty_not_fatal() {
        let index = build_index(
            Path::new("/nonexistent/docs"),
            100,
            20,
            Arc::new(TrigramProvider::new(64)),
        )
        .await
        .unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_reingestion_is_deterministic() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("doc.txt"),
            "All policy questions are answered from the handbook. ".repeat(10),
        )
        .unwrap();

        let provider = Arc::new(TrigramProvider::new(64));
        let first = build_index(temp.path(), 80, 20, provider.clone())
            .await
            .unwrap();
        let second = build_index(temp.path(), 80, 20, provider).await.unwrap();

        assert_eq!(first.len(), second.len());
    }
}
