//! In-memory embedding index with snapshot persistence.
//!
//! The index is built once at startup (single writer), then shared
//! read-only behind an `Arc` for the lifetime of the process. A rebuild is
//! a stop-the-world operation: construct a new index, then publish the new
//! reference.

use crate::embeddings::EmbeddingProvider;
use crate::types::{Chunk, SnapshotRecord};
use pathway_core::{AppError, AppResult};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Logical pairing of a chunk with its vector.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// In-memory nearest-neighbor index over chunk embeddings.
pub struct EmbeddingIndex {
    entries: Vec<IndexEntry>,
    ids: HashSet<String>,
    provider: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingIndex {
    /// Create an empty index backed by the given embedding provider.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            entries: Vec::new(),
            ids: HashSet::new(),
            provider,
        }
    }

    /// Embed and insert chunks, preserving their order.
    ///
    /// Build-time only; not safe to call concurrently with `query`. A chunk
    /// id already present is skipped with a warning — the index never holds
    /// duplicate entries for the same chunk.
    ///
    /// # Errors
    /// `AppError::Embedding` if the embedding provider fails; this is fatal
    /// at startup since no index can be served without vectors.
    pub async fn insert(&mut self, chunks: &[Chunk]) -> AppResult<()> {
        let fresh: Vec<&Chunk> = chunks
            .iter()
            .filter(|chunk| {
                if self.ids.contains(&chunk.id) {
                    tracing::warn!("Skipping duplicate chunk id: {}", chunk.id);
                    false
                } else {
                    true
                }
            })
            .collect();

        if fresh.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = fresh.iter().map(|c| c.text.clone()).collect();
        let vectors = self.provider.embed_batch(&texts).await?;

        if vectors.len() != fresh.len() {
            return Err(AppError::Embedding(format!(
                "Provider returned {} vectors for {} chunks",
                vectors.len(),
                fresh.len()
            )));
        }

        for (chunk, vector) in fresh.into_iter().zip(vectors) {
            self.ids.insert(chunk.id.clone());
            self.entries.push(IndexEntry {
                chunk: chunk.clone(),
                vector,
            });
        }

        tracing::debug!("Index now holds {} entries", self.entries.len());
        Ok(())
    }

    /// Query for the top-k most similar chunks.
    ///
    /// Results are sorted by descending cosine similarity; ties keep
    /// ascending insertion order (stable sort). `k` larger than the corpus
    /// returns all entries. An empty index returns an empty sequence, never
    /// an error.
    pub async fn query(&self, text: &str, k: usize) -> AppResult<Vec<(Chunk, f32)>> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.provider.embed(text).await?;

        let mut results: Vec<(Chunk, f32)> = self
            .entries
            .iter()
            .map(|entry| {
                let score = cosine_similarity(&query_vector, &entry.vector);
                (entry.chunk.clone(), score)
            })
            .collect();

        // Stable sort: equal scores keep insertion order
        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);

        tracing::debug!("Retrieved {} chunks (requested top-{})", results.len(), k);
        Ok(results)
    }

    /// Number of index entries (always equals the chunk count).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct documents represented in the index.
    pub fn document_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.chunk.document_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Persist the index as an ordered list of snapshot records.
    pub fn save_snapshot(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Retrieval(format!("Failed to create snapshot directory: {}", e))
            })?;
        }

        let records: Vec<SnapshotRecord> = self
            .entries
            .iter()
            .map(|entry| SnapshotRecord {
                chunk_id: entry.chunk.id.clone(),
                vector: entry.vector.clone(),
                text: entry.chunk.text.clone(),
                document_id: entry.chunk.document_id.clone(),
                ordinal: entry.chunk.ordinal,
                start_offset: entry.chunk.start_offset,
            })
            .collect();

        let json = serde_json::to_string(&records)?;
        std::fs::write(path, json)
            .map_err(|e| AppError::Retrieval(format!("Failed to write snapshot: {}", e)))?;

        tracing::info!("Saved index snapshot ({} entries) to {:?}", records.len(), path);
        Ok(())
    }

    /// Reload an index from a snapshot without re-embedding.
    ///
    /// The provider is still required for query-time embedding.
    pub fn load_snapshot(
        path: &Path,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| AppError::Retrieval(format!("Failed to read snapshot: {}", e)))?;
        let records: Vec<SnapshotRecord> = serde_json::from_str(&json)?;

        let mut index = Self::new(provider);
        for record in records {
            if !index.ids.insert(record.chunk_id.clone()) {
                tracing::warn!("Snapshot contains duplicate chunk id: {}", record.chunk_id);
                continue;
            }
            index.entries.push(IndexEntry {
                chunk: Chunk {
                    id: record.chunk_id,
                    document_id: record.document_id,
                    ordinal: record.ordinal,
                    text: record.text,
                    start_offset: record.start_offset,
                },
                vector: record.vector,
            });
        }

        tracing::info!(
            "Loaded index snapshot ({} entries) from {:?}",
            index.entries.len(),
            path
        );
        Ok(index)
    }
}

/// Calculate cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::trigram::TrigramProvider;
    use tempfile::TempDir;

    fn chunk(id: &str, text: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            document_id: "doc.txt".to_string(),
            ordinal: 0,
            text: text.to_string(),
            start_offset: 0,
        }
    }

    fn test_index() -> EmbeddingIndex {
        EmbeddingIndex::new(Arc::new(TrigramProvider::new(64)))
    }

    #[tokio::test]
    async fn test_empty_index_returns_empty() {
        let index = test_index();
        let results = index.query("anything", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_insert_and_query_ordering() {
        let mut index = test_index();
        index
            .insert(&[
                chunk("a", "proof of identity documents passport"),
                chunk("b", "application fees and payment schedule"),
                chunk("c", "identity documents certified copies passport"),
            ])
            .await
            .unwrap();

        let results = index.query("identity documents passport", 3).await.unwrap();
        assert_eq!(results.len(), 3);

        // Sorted by strictly non-increasing similarity
        for pair in results.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        // The fee chunk is the worst match
        assert_eq!(results[2].0.id, "b");
    }

    #[tokio::test]
    async fn test_k_larger_than_corpus_returns_all() {
        let mut index = test_index();
        index
            .insert(&[chunk("a", "first entry"), chunk("b", "second entry")])
            .await
            .unwrap();

        let results = index.query("entry", 100).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let mut index = test_index();
        // Identical texts embed identically, so scores tie exactly
        index
            .insert(&[
                chunk("first", "same text"),
                chunk("second", "same text"),
                chunk("third", "same text"),
            ])
            .await
            .unwrap();

        let results = index.query("same text", 3).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|(c, _)| c.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_duplicate_chunk_ids_skipped() {
        let mut index = test_index();
        index.insert(&[chunk("a", "original")]).await.unwrap();
        index.insert(&[chunk("a", "duplicate")]).await.unwrap();
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_entry_count_equals_chunk_count() {
        let mut index = test_index();
        let chunks: Vec<Chunk> = (0..5)
            .map(|i| chunk(&format!("c{}", i), &format!("chunk number {}", i)))
            .collect();
        index.insert(&chunks).await.unwrap();
        assert_eq!(index.len(), chunks.len());
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip_without_reembedding() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.json");

        let mut index = test_index();
        index
            .insert(&[
                chunk("a", "proof of identity documents"),
                chunk("b", "application fees"),
            ])
            .await
            .unwrap();
        index.save_snapshot(&path).unwrap();

        let reloaded =
            EmbeddingIndex::load_snapshot(&path, Arc::new(TrigramProvider::new(64))).unwrap();
        assert_eq!(reloaded.len(), 2);

        let original = index.query("identity documents", 2).await.unwrap();
        let restored = reloaded.query("identity documents", 2).await.unwrap();
        assert_eq!(original.len(), restored.len());
        for (a, b) in original.iter().zip(restored.iter()) {
            assert_eq!(a.0.id, b.0.id);
            assert!((a.1 - b.1).abs() < 1e-6);
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![1.0, 0.0, 0.0];
        let d = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&c, &d) - 0.0).abs() < 0.001);
    }
}
