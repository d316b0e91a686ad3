//! Chat provider trait and common types.
//!
//! Models the subset of a tool-calling chat API the agent loop needs:
//! role-tagged messages, tool definitions, and assistant replies that either
//! carry a final answer or a batch of tool calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::LlmError;
use crate::tools::Tool;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Sets context/behavior
    System,
    /// Task input
    User,
    /// Model output
    Assistant,
    /// Result of a tool call
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Provider-assigned id echoed back with the result
    pub id: String,
    /// Tool name
    pub name: String,
    /// Decoded arguments; a string if the model sent invalid JSON
    pub arguments: Value,
}

/// A message in a conversation with the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: Option<String>,
    /// Tool calls requested by an assistant message
    pub tool_calls: Vec<ToolCall>,
    /// Id of the call a tool message answers
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(ChatRole::System, content)
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(ChatRole::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(ChatRole::Assistant, content)
    }

    /// Create an assistant message requesting tool calls.
    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: None,
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Create the reply to a tool call.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Tool definition advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn from_tool(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            parameters: tool.parameters(),
        }
    }
}

/// Whether the model may call tools on this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolChoice {
    /// Model decides
    #[default]
    Auto,
    /// Model must answer in text
    None,
}

/// A single completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub messages: &'a [ChatMessage],
    pub tools: &'a [ToolDefinition],
    pub tool_choice: ToolChoice,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Token usage information from a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The model's reply.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Assistant message (final text or tool calls)
    pub message: ChatMessage,
    pub usage: Option<TokenUsage>,
}

/// A chat completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    /// Run one completion.
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<ChatResponse, LlmError>;
}
