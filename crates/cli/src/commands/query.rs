//! `pathway query` — one-shot retrieval without a conversation.

use pathway_core::{AppConfig, AppResult};
use pathway_knowledge::embeddings::create_provider;
use pathway_knowledge::{build_index, EmbeddingIndex, Retriever};
use std::sync::Arc;
use std::time::Duration;

pub async fn run(config: AppConfig, text: &str, top_k: Option<usize>) -> AppResult<()> {
    config.validate()?;

    let timeout = Duration::from_secs(config.network.timeout_secs);
    let provider = create_provider(&config.embedding, timeout)?;

    let index = match EmbeddingIndex::load_snapshot(&config.snapshot_path, provider.clone()) {
        Ok(index) => index,
        Err(_) => {
            tracing::info!("No snapshot; building index from corpus");
            build_index(
                &config.corpus_path,
                config.chunk_size,
                config.chunk_overlap,
                provider,
            )
            .await?
        }
    };

    let retriever = Retriever::new(Arc::new(index), top_k.unwrap_or(config.top_k));
    let outcome = retriever.retrieve(text).await;

    println!("{}", outcome.text);
    if !outcome.sources.is_empty() {
        println!("\nSources: {}", outcome.sources.join(", "));
    }
    Ok(())
}
