//! Process-wide application context.
//!
//! Built once at startup from the validated config: corpus ingestion (or
//! snapshot reload), index publication and provider construction all
//! happen here. Sessions are cheap handles created per conversation on
//! top of the shared read-only state.

use crate::mail::{MailDispatcher, SmtpMailer};
use crate::orchestrator::Orchestrator;
use crate::router::{LlmClassifier, QueryClassifier};
use crate::web_search::{DuckDuckGoSearch, SearchProvider};
use pathway_core::{AppConfig, AppResult, ToolVariant};
use pathway_knowledge::embeddings::create_provider;
use pathway_knowledge::{index_documents, ingest, EmbeddingIndex, Retriever};
use pathway_llm::LlmClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct AppContext {
    config: AppConfig,
    index: Arc<EmbeddingIndex>,
    llm: Arc<dyn LlmClient>,
    classifier: Arc<dyn QueryClassifier>,
    mailer: Arc<dyn MailDispatcher>,
    search: Option<Arc<dyn SearchProvider>>,
}

impl AppContext {
    /// Build the context: load or build the index, wire up providers.
    ///
    /// A readable snapshot is preferred over re-embedding, but only while
    /// its document count matches the corpus on disk; a missing, corrupt
    /// or stale snapshot falls back to a full rebuild.
    pub async fn initialize(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        config.ensure_state_dir()?;

        let timeout = Duration::from_secs(config.network.timeout_secs);
        let embedder = create_provider(&config.embedding, timeout)?;

        let documents = ingest::ingest(&config.corpus_path)?;
        let index = match EmbeddingIndex::load_snapshot(&config.snapshot_path, embedder.clone()) {
            Ok(index) if index.document_count() == documents.len() => index,
            Ok(index) => {
                info!(
                    "Snapshot covers {} documents but the corpus has {}; rebuilding",
                    index.document_count(),
                    documents.len()
                );
                Self::rebuild(&config, &documents, embedder).await?
            }
            Err(e) => {
                info!("No usable snapshot ({}); building index from corpus", e);
                Self::rebuild(&config, &documents, embedder).await?
            }
        };

        info!(
            "Knowledge base ready: {} chunks from {} documents",
            index.len(),
            index.document_count()
        );

        let llm = pathway_llm::create_client(&config.llm, timeout)?;
        let classifier: Arc<dyn QueryClassifier> =
            Arc::new(LlmClassifier::new(llm.clone(), config.network.max_retries));
        let mailer: Arc<dyn MailDispatcher> =
            Arc::new(SmtpMailer::new(&config.mail, config.network.max_retries)?);
        let search: Option<Arc<dyn SearchProvider>> = match config.tool_variant {
            ToolVariant::Search => Some(Arc::new(DuckDuckGoSearch::new(timeout)?)),
            ToolVariant::Escalation => None,
        };

        Ok(Self {
            config,
            index: Arc::new(index),
            llm,
            classifier,
            mailer,
            search,
        })
    }

    async fn rebuild(
        config: &AppConfig,
        documents: &[pathway_knowledge::Document],
        embedder: Arc<dyn pathway_knowledge::embeddings::EmbeddingProvider>,
    ) -> AppResult<EmbeddingIndex> {
        let index = index_documents(
            documents,
            config.chunk_size,
            config.chunk_overlap,
            embedder,
        )
        .await?;
        if let Err(e) = index.save_snapshot(&config.snapshot_path) {
            warn!("Could not persist index snapshot: {}", e);
        }
        Ok(index)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<EmbeddingIndex> {
        &self.index
    }

    /// Persist the index snapshot so the next startup skips re-embedding.
    pub fn shutdown(&self) -> AppResult<()> {
        self.index.save_snapshot(&self.config.snapshot_path)
    }

    /// Start a fresh conversation over the shared knowledge base.
    pub fn new_session(&self) -> Orchestrator {
        let retriever = Arc::new(Retriever::new(self.index.clone(), self.config.top_k));
        Orchestrator::new(
            &self.config,
            self.llm.clone(),
            retriever,
            self.classifier.clone(),
            self.mailer.clone(),
            self.search.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathway_knowledge::SnapshotRecord;
    use tempfile::TempDir;

    fn test_config(workspace: &std::path::Path) -> AppConfig {
        std::env::set_var("PATHWAY_CONTEXT_TEST_PW", "secret");
        let mut config = AppConfig::default();
        config.workspace = workspace.to_path_buf();
        config.corpus_path = workspace.join("docs");
        config.snapshot_path = workspace.join(".pathway").join("index.json");
        config.mail.password_env = "PATHWAY_CONTEXT_TEST_PW".to_string();
        config
    }

    #[tokio::test]
    async fn test_initialize_rebuilds_when_corpus_changes() {
        let temp = TempDir::new().unwrap();
        let docs = temp.path().join("docs");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(docs.join("a.txt"), "passport rules for identity checks").unwrap();

        let context = AppContext::initialize(test_config(temp.path()))
            .await
            .unwrap();
        assert_eq!(context.index().document_count(), 1);
        drop(context);

        // A document added after the snapshot was written must be indexed
        std::fs::write(docs.join("b.txt"), "application fees are due upfront").unwrap();
        let context = AppContext::initialize(test_config(temp.path()))
            .await
            .unwrap();
        assert_eq!(context.index().document_count(), 2);
    }

    #[tokio::test]
    async fn test_initialize_prefers_snapshot_when_corpus_unchanged() {
        let temp = TempDir::new().unwrap();
        let docs = temp.path().join("docs");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(docs.join("a.txt"), "passport rules for identity checks").unwrap();

        let config = test_config(temp.path());

        // A hand-written snapshot with a marker entry and a matching
        // document count; reuse means this entry is served, not the corpus
        let records = vec![SnapshotRecord {
            chunk_id: "marker.md:0".to_string(),
            vector: vec![0.1; config.embedding.dimensions],
            text: "snapshot marker text".to_string(),
            document_id: "marker.md".to_string(),
            ordinal: 0,
            start_offset: 0,
        }];
        std::fs::create_dir_all(config.snapshot_path.parent().unwrap()).unwrap();
        std::fs::write(
            &config.snapshot_path,
            serde_json::to_string(&records).unwrap(),
        )
        .unwrap();

        let context = AppContext::initialize(config).await.unwrap();
        let results = context.index().query("passport rules", 1).await.unwrap();
        assert_eq!(results[0].0.document_id, "marker.md");
    }
}
