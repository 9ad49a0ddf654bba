//! Error types for the Pathway assistant.
//!
//! This module defines a unified error enum covering every failure category
//! in the application: configuration, ingestion, embedding, retrieval,
//! language-model calls, mail dispatch, and validation.

use thiserror::Error;

/// Unified error type for the Pathway assistant.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document ingestion errors (skippable per document, never fatal)
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Embedding model errors (fatal at index build time)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Retrieval / index errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Language-model provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Mail dispatch errors
    #[error("Mail error: {0}")]
    Mail(String),

    /// Input validation errors (handled locally by re-prompting)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
