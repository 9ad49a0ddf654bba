//! `pathway stats` — index and corpus statistics.

use pathway_core::{AppConfig, AppResult};
use pathway_knowledge::embeddings::create_provider;
use pathway_knowledge::EmbeddingIndex;
use std::time::Duration;

pub async fn run(config: AppConfig) -> AppResult<()> {
    let timeout = Duration::from_secs(config.network.timeout_secs);
    let provider = create_provider(&config.embedding, timeout)?;

    println!("Workspace:  {:?}", config.workspace);
    println!("Corpus:     {:?}", config.corpus_path);
    println!("Snapshot:   {:?}", config.snapshot_path);
    println!("Variant:    {:?}", config.tool_variant);
    println!(
        "Chunking:   {} chars, {} overlap, top-{}",
        config.chunk_size, config.chunk_overlap, config.top_k
    );

    match EmbeddingIndex::load_snapshot(&config.snapshot_path, provider) {
        Ok(index) => {
            println!(
                "Index:      {} chunks from {} documents",
                index.len(),
                index.document_count()
            );
        }
        Err(_) => {
            println!("Index:      no snapshot (run `pathway ingest` first)");
        }
    }
    Ok(())
}
