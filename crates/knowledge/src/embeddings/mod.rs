//! Embedding generation for knowledge chunks.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
