//! LLM client abstraction and chat/tool-calling types.
//!
//! This module defines the core abstractions for interacting with LLM
//! providers that support structured tool calls.

use pathway_core::AppResult;
use serde::{Deserialize, Serialize};

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A structured request from the model to invoke a named tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name as declared in its schema
    pub name: String,

    /// JSON arguments object
    pub arguments: serde_json::Value,
}

/// Declaration of a tool the model is allowed to call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,

    /// JSON Schema for the arguments object
    pub parameters: serde_json::Value,
}

/// One message in a conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,

    /// Tool calls carried by an assistant message (empty otherwise)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// An assistant message that requested tool invocations.
    pub fn assistant_with_calls(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: calls,
        }
    }

    /// A tool-output message fed back to the model.
    pub fn tool(content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }
}

/// Model reply: either a final answer or a batch of tool calls.
///
/// A reply with an empty `tool_calls` list is final; otherwise the caller
/// executes the requested tools and feeds their outputs back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmReply {
    /// Assistant text (may be empty when the model only calls tools)
    pub content: String,

    /// Requested tool invocations, in the order the model issued them
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl LlmReply {
    /// Whether this reply ends the tool-calling loop.
    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// Trait for LLM providers supporting tool-calling chat completion.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "ollama").
    fn provider_name(&self) -> &str;

    /// Complete a conversation under a system policy, with the given tool
    /// schemas available to the model.
    ///
    /// Returns a final text reply or a list of tool calls to execute.
    async fn complete_with_tools(
        &self,
        system: &str,
        history: &[ChatMessage],
        tools: &[ToolSchema],
    ) -> AppResult<LlmReply>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_finality() {
        let final_reply = LlmReply {
            content: "done".to_string(),
            tool_calls: vec![],
        };
        assert!(final_reply.is_final());

        let tool_reply = LlmReply {
            content: String::new(),
            tool_calls: vec![ToolCall {
                name: "lookup".to_string(),
                arguments: serde_json::json!({"query": "fees"}),
            }],
        };
        assert!(!tool_reply.is_final());
    }

    #[test]
    fn test_message_constructors() {
        let msg = ChatMessage::user("hello");
        assert_eq!(msg.role, Role::User);
        assert!(msg.tool_calls.is_empty());

        let call = ToolCall {
            name: "lookup".to_string(),
            arguments: serde_json::json!({}),
        };
        let msg = ChatMessage::assistant_with_calls("", vec![call]);
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.tool_calls.len(), 1);
    }
}
