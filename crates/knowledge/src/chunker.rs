//! Deterministic text chunking with configurable size and overlap.
//!
//! Chunks are character windows: the window advances by
//! `chunk_size - chunk_overlap` characters, so the trailing
//! `chunk_overlap` characters of each chunk equal the leading characters of
//! the next. The final chunk of a document may be shorter than
//! `chunk_size`. Identical document content always yields an identical
//! chunk sequence.

use crate::types::{Chunk, Document};

/// Split a document into overlapping chunks.
///
/// Requires `chunk_overlap < chunk_size` (validated at config load); an
/// invalid combination yields no chunks rather than looping.
pub fn chunk_document(doc: &Document, chunk_size: usize, chunk_overlap: usize) -> Vec<Chunk> {
    if chunk_size == 0 || chunk_overlap >= chunk_size {
        tracing::warn!(
            "Invalid chunking parameters (size: {}, overlap: {}); skipping {}",
            chunk_size,
            chunk_overlap,
            doc.id
        );
        return Vec::new();
    }

    let chars: Vec<char> = doc.raw_text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let step = chunk_size - chunk_overlap;
    let mut chunks = Vec::new();
    let mut ordinal = 0u32;
    let mut start = 0usize;

    loop {
        let end = (start + chunk_size).min(chars.len());
        let text: String = chars[start..end].iter().collect();

        chunks.push(Chunk {
            id: format!("{}:{}", doc.id, ordinal),
            document_id: doc.id.clone(),
            ordinal,
            text,
            start_offset: start,
        });

        if end == chars.len() {
            break;
        }

        ordinal += 1;
        start += step;
    }

    tracing::debug!(
        "Chunked {} into {} chunks (size: {}, overlap: {})",
        doc.id,
        chunks.len(),
        chunk_size,
        chunk_overlap
    );

    chunks
}

/// Chunk every document of a corpus, preserving document order.
pub fn chunk_corpus(docs: &[Document], chunk_size: usize, chunk_overlap: usize) -> Vec<Chunk> {
    docs.iter()
        .flat_map(|doc| chunk_document(doc, chunk_size, chunk_overlap))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document {
            id: "test.txt".to_string(),
            source_path: "test.txt".into(),
            raw_text: text.to_string(),
        }
    }

    #[test]
    fn test_adjacent_chunks_share_exact_overlap() {
        let text: String = ('a'..='z').cycle().take(260).collect();
        let chunks = chunk_document(&doc(&text), 100, 30);

        assert!(chunks.len() >= 2);
        for pair in chunks.windows(2) {
            let tail: String = pair[0].text.chars().skip(100 - 30).collect();
            let head: String = pair[1].text.chars().take(30).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_chunk_count_matches_window_arithmetic() {
        // ceil((L - O) / (S - O)) with L=1000, S=200, O=50 -> ceil(950/150) = 7
        let text = "x".repeat(1000);
        let chunks = chunk_document(&doc(&text), 200, 50);
        assert_eq!(chunks.len(), 7);

        // Exact fit: L=300, S=100, O=0 -> 3 chunks
        let text = "y".repeat(300);
        let chunks = chunk_document(&doc(&text), 100, 0);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_ordinals_and_offsets_are_monotonic() {
        let text = "z".repeat(500);
        let chunks = chunk_document(&doc(&text), 100, 20);

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.ordinal, i as u32);
            assert_eq!(chunk.start_offset, i * 80);
            assert_eq!(chunk.id, format!("test.txt:{}", i));
        }
    }

    #[test]
    fn test_final_chunk_may_be_short() {
        let text = "a".repeat(250);
        let chunks = chunk_document(&doc(&text), 100, 0);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].text.chars().count(), 50);
    }

    #[test]
    fn test_deterministic() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(20);
        let first = chunk_document(&doc(&text), 64, 16);
        let second = chunk_document(&doc(&text), 64, 16);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_document() {
        let chunks = chunk_document(&doc(""), 100, 10);
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_short_document_single_chunk() {
        let chunks = chunk_document(&doc("short"), 100, 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short");
        assert_eq!(chunks[0].start_offset, 0);
    }

    #[test]
    fn test_multibyte_characters_are_window_units() {
        // Character windows, not byte windows: no boundary panics
        let text = "héllo wörld ".repeat(30);
        let chunks = chunk_document(&doc(&text), 50, 10);
        assert!(!chunks.is_empty());
        for pair in chunks.windows(2) {
            let tail: String = pair[0].text.chars().skip(40).collect();
            let head: String = pair[1].text.chars().take(10).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_invalid_parameters_yield_no_chunks() {
        let chunks = chunk_document(&doc("some text"), 10, 10);
        assert!(chunks.is_empty());
    }
}
