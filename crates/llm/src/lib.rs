//! Pathway LLM Library
//!
//! Language-model client abstraction with structured tool calling, an
//! Ollama provider, and bounded-retry helpers for network calls.

pub mod client;
pub mod factory;
pub mod providers;
pub mod retry;

// Re-export commonly used types
pub use client::{ChatMessage, LlmClient, LlmReply, Role, ToolCall, ToolSchema};
pub use factory::create_client;
pub use retry::with_retry;
