//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A source document loaded from the corpus. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document identifier (corpus-relative path)
    pub id: String,

    /// Filesystem path the document was loaded from
    pub source_path: PathBuf,

    /// Extracted text content
    pub raw_text: String,
}

/// A bounded, possibly overlapping substring of a document — the retrieval
/// unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk identifier (`{document_id}:{ordinal}`)
    pub id: String,

    /// Owning document
    pub document_id: String,

    /// Position within the document, monotonically increasing, assigned at
    /// chunking time and never reordered
    pub ordinal: u32,

    /// Text content
    pub text: String,

    /// Character offset of this chunk's start within the document
    pub start_offset: usize,
}

/// One record of a persisted index snapshot.
///
/// An ordered list of these is sufficient to reconstruct the embedding
/// index without re-embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub chunk_id: String,
    pub vector: Vec<f32>,
    pub text: String,
    pub document_id: String,
    pub ordinal: u32,
    #[serde(default)]
    pub start_offset: usize,
}
