//! Tool-calling agent runner.
//!
//! An agent is a role (persona), a task and a set of tools. The runner sends
//! the role and task to the model, executes whatever tools the model asks for,
//! feeds the results back, and returns the first reply that carries no tool
//! calls. After `max_iterations` tool rounds the model is told to answer with
//! what it has, with tool use disabled.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::provider::{
    ChatMessage, ChatProvider, ChatRequest, ToolCall, ToolChoice, ToolDefinition,
};
use super::OpenAIProvider;
use crate::config::{LlmSettings, RoleConfig};
use crate::tools::SharedTool;

const FINAL_ANSWER_PROMPT: &str = "You have used the maximum number of tool calls. \
Give your best final answer now using only the information gathered so far.";

/// A configured agent: persona plus the tools it may call.
#[derive(Clone)]
pub struct AgentSpec {
    /// Config key of the role, for logs
    pub name: String,
    pub role: RoleConfig,
    pub tools: Vec<SharedTool>,
    /// Log every tool call at info instead of debug
    pub verbose: bool,
}

/// A concrete task for one agent run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTask {
    pub description: String,
    pub expected_output: String,
}

/// Runs an agent on a task and returns its final text.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run(&self, agent: &AgentSpec, task: &AgentTask) -> Result<String>;
}

/// [`AgentRunner`] driving a chat provider's function calling.
pub struct ToolCallingAgent {
    provider: Arc<dyn ChatProvider>,
    temperature: f32,
    max_tokens: u32,
    max_iterations: usize,
}

impl ToolCallingAgent {
    pub fn new(provider: Arc<dyn ChatProvider>, settings: &LlmSettings) -> Self {
        Self {
            provider,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            max_iterations: settings.max_iterations,
        }
    }

    /// Build a runner backed by the OpenAI provider.
    pub fn openai(settings: &LlmSettings, api_key: Option<String>) -> Self {
        let mut provider = OpenAIProvider::new(api_key, settings.model.clone());
        if let Some(base_url) = &settings.base_url {
            provider = provider.with_base_url(base_url.clone());
        }
        if !provider.is_configured() {
            warn!("OPENAI_API_KEY not set; every agent run will fail until it is provided");
        }
        Self::new(Arc::new(provider), settings)
    }

    fn system_prompt(role: &RoleConfig) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}\n\
             Use the available tools to gather facts before answering. \
             When you have enough information, reply with your final answer only.",
            role.role.trim(),
            role.backstory.trim(),
            role.goal.trim()
        )
    }

    fn task_prompt(task: &AgentTask) -> String {
        format!(
            "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\n\
             You MUST return the actual complete content as the final answer, not a summary.",
            task.description.trim(),
            task.expected_output.trim()
        )
    }

    async fn call_tool(agent: &AgentSpec, call: &ToolCall) -> String {
        let Some(tool) = agent.tools.iter().find(|tool| tool.name() == call.name) else {
            warn!(agent = %agent.name, tool = %call.name, "Model requested an unknown tool");
            let available: Vec<_> = agent.tools.iter().map(|tool| tool.name()).collect();
            return format!(
                "Error: unknown tool '{}'. Available tools: {}",
                call.name,
                available.join(", ")
            );
        };

        let output = tool.invoke(call.arguments.clone()).await;

        if agent.verbose {
            info!(agent = %agent.name, tool = %call.name, arguments = %call.arguments, output = %output, "Tool call");
        } else {
            debug!(agent = %agent.name, tool = %call.name, arguments = %call.arguments, output = %output, "Tool call");
        }

        output
    }

    fn request<'a>(
        &self,
        messages: &'a [ChatMessage],
        tools: &'a [ToolDefinition],
        tool_choice: ToolChoice,
    ) -> ChatRequest<'a> {
        ChatRequest {
            messages,
            tools,
            tool_choice,
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        }
    }
}

fn final_text(message: ChatMessage) -> Result<String> {
    match message.content {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => anyhow::bail!("agent returned an empty final answer"),
    }
}

#[async_trait]
impl AgentRunner for ToolCallingAgent {
    async fn run(&self, agent: &AgentSpec, task: &AgentTask) -> Result<String> {
        let definitions: Vec<ToolDefinition> = agent
            .tools
            .iter()
            .map(|tool| ToolDefinition::from_tool(tool.as_ref()))
            .collect();

        let mut messages = vec![
            ChatMessage::system(Self::system_prompt(&agent.role)),
            ChatMessage::user(Self::task_prompt(task)),
        ];

        debug!(
            agent = %agent.name,
            provider = self.provider.name(),
            tools = definitions.len(),
            "Starting agent run"
        );

        for round in 1..=self.max_iterations {
            let response = self
                .provider
                .complete(&self.request(&messages, &definitions, ToolChoice::Auto))
                .await
                .with_context(|| format!("Agent {} failed on round {round}", agent.name))?;

            if let Some(usage) = response.usage {
                debug!(agent = %agent.name, round, total_tokens = usage.total_tokens, "Completion usage");
            }

            let reply = response.message;
            if reply.tool_calls.is_empty() {
                debug!(agent = %agent.name, round, "Agent produced final answer");
                return final_text(reply);
            }

            let calls = reply.tool_calls.clone();
            messages.push(reply);
            for call in &calls {
                let output = Self::call_tool(agent, call).await;
                messages.push(ChatMessage::tool_result(call.id.clone(), output));
            }
        }

        warn!(
            agent = %agent.name,
            max_iterations = self.max_iterations,
            "Tool-call limit reached, requesting final answer"
        );
        messages.push(ChatMessage::user(FINAL_ANSWER_PROMPT));

        let response = self
            .provider
            .complete(&self.request(&messages, &definitions, ToolChoice::None))
            .await
            .with_context(|| format!("Agent {} failed on final answer", agent.name))?;

        final_text(response.message)
    }
}
