//! Corpus discovery and text extraction.
//!
//! Ingestion is a batch, startup-time operation: documents are loaded once
//! and never mutated afterwards. Per-document failures are skipped with a
//! warning and never abort the run.

use crate::types::Document;
use pathway_core::{AppError, AppResult};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Discover and load all documents under `corpus_path`.
///
/// A missing or empty corpus directory yields an empty result with a
/// warning, not an error. Files are visited in path order so document ids
/// are stable across runs.
pub fn ingest(corpus_path: &Path) -> AppResult<Vec<Document>> {
    if !corpus_path.is_dir() {
        tracing::warn!(
            "Corpus directory {:?} does not exist; starting with an empty index",
            corpus_path
        );
        return Ok(Vec::new());
    }

    let mut documents = Vec::new();

    for entry in WalkDir::new(corpus_path)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let text = match extract_text(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Skipping document {:?}: {}", path, e);
                continue;
            }
        };

        if text.trim().is_empty() {
            tracing::debug!("Skipping empty document {:?}", path);
            continue;
        }

        let id = path
            .strip_prefix(corpus_path)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        documents.push(Document {
            id,
            source_path: path.to_path_buf(),
            raw_text: text,
        });
    }

    if documents.is_empty() {
        tracing::warn!("No readable documents found under {:?}", corpus_path);
    } else {
        tracing::info!(
            "Loaded {} documents from {:?}",
            documents.len(),
            corpus_path
        );
    }

    Ok(documents)
}

/// Extract clean text from a source file based on its extension.
fn extract_text(path: &Path) -> AppResult<String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Ingestion(format!("Failed to read {:?}: {}", path, e)))?;

    if raw.contains('\0') {
        return Err(AppError::Ingestion(format!(
            "Binary file not supported: {:?}",
            path
        )));
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some("md") | Some("markdown") => Ok(clean_markdown(&raw)),
        _ => Ok(raw),
    }
}

/// Strip markdown structure that adds no retrieval value.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        // Skip horizontal rules and code fences
        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_corpus_yields_empty() {
        let result = ingest(Path::new("/nonexistent/corpus")).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_loads_documents_in_stable_order() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.txt"), "second document").unwrap();
        fs::write(temp.path().join("a.txt"), "first document").unwrap();

        let docs = ingest(temp.path()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "a.txt");
        assert_eq!(docs[1].id, "b.txt");
        assert_eq!(docs[0].raw_text, "first document");
    }

    #[test]
    fn test_skips_empty_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("empty.txt"), "").unwrap();
        fs::write(temp.path().join("real.txt"), "content").unwrap();

        let docs = ingest(temp.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "real.txt");
    }

    #[test]
    fn test_clean_markdown() {
        let input = "# Header\n\nSome text\n\n```rust\ncode\n```\n\nMore text";
        let output = clean_markdown(input);
        assert!(output.contains("Header"));
        assert!(output.contains("Some text"));
        assert!(output.contains("More text"));
        assert!(!output.contains("```"));
    }
}
