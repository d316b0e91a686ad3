//! Language-model plumbing: chat providers and the tool-calling agent.

pub mod agent;
pub mod openai;
pub mod provider;

use thiserror::Error;

pub use agent::{AgentRunner, AgentSpec, AgentTask, ToolCallingAgent};
pub use openai::{OpenAIProvider, ENV_OPENAI_API_KEY};
pub use provider::{
    ChatMessage, ChatProvider, ChatRequest, ChatResponse, ChatRole, TokenUsage, ToolCall,
    ToolChoice, ToolDefinition,
};

/// Errors from a chat provider.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key configured
    #[error("{} not set", openai::ENV_OPENAI_API_KEY)]
    MissingApiKey,

    /// Transport failure
    #[error("LLM API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error status
    #[error("LLM API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded
    #[error("failed to parse LLM response: {0}")]
    Decode(String),

    /// The response had no choices
    #[error("LLM returned no choices")]
    EmptyResponse,
}
