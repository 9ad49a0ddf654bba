//! `pathway ingest` — build the index from the corpus and persist it.

use pathway_core::{AppConfig, AppResult};
use pathway_knowledge::build_index;
use pathway_knowledge::embeddings::create_provider;
use std::time::Duration;

pub async fn run(config: AppConfig) -> AppResult<()> {
    config.validate()?;
    config.ensure_state_dir()?;

    let timeout = Duration::from_secs(config.network.timeout_secs);
    let provider = create_provider(&config.embedding, timeout)?;

    println!("Ingesting corpus from {:?}...", config.corpus_path);
    let index = build_index(
        &config.corpus_path,
        config.chunk_size,
        config.chunk_overlap,
        provider,
    )
    .await?;

    index.save_snapshot(&config.snapshot_path)?;

    println!(
        "Indexed {} chunks from {} documents.",
        index.len(),
        index.document_count()
    );
    println!("Snapshot written to {:?}", config.snapshot_path);
    Ok(())
}
