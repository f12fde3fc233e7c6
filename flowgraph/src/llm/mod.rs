//! Generation capability.
//!
//! Nodes that need text from a model depend on [`LlmClient`]; the engine never
//! calls it directly. `MockLlm` scripts responses for tests, `ChatOpenAI`
//! (feature `openai`) talks to an OpenAI-compatible Chat Completions endpoint.

mod mock;

/// Tool choice mode for chat completions: when tools are present, controls whether
/// the model may choose (auto), must not use (none), or must use (required).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ToolChoiceMode {
    /// Model can pick between message or tool calls. Default when tools are present.
    #[default]
    Auto,
    /// Model will not call any tool.
    None,
    /// Model must call one or more tools.
    Required,
}

impl std::str::FromStr for ToolChoiceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "none" => Ok(Self::None),
            "required" => Ok(Self::Required),
            _ => Err(format!(
                "unknown tool_choice: {} (use auto, none, or required)",
                s
            )),
        }
    }
}

#[cfg(feature = "openai")]
mod openai;

pub use mock::MockLlm;

#[cfg(feature = "openai")]
pub use openai::ChatOpenAI;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AgentError;
use crate::message::{Message, ToolCall};

/// Per-call generation options. `None` fields fall back to the client's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateOptions {
    pub model: Option<String>,
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl GenerateOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }
}

/// Response from an LLM completion: assistant message text and optional tool calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmResponse {
    /// Assistant message content (plain text).
    pub content: String,
    /// Tool calls from this turn; empty means the model answered directly.
    pub tool_calls: Vec<ToolCall>,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// The response as an assistant message for the conversation history.
    pub fn into_message(self) -> Message {
        Message::Assistant {
            content: self.content,
            tool_calls: self.tool_calls,
        }
    }
}

/// LLM client: given messages, returns assistant text and optional tool_calls.
///
/// Transport and auth failures are `AgentError::Provider`; a node calling the
/// client propagates them, and the engine reports them as that node's failure.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Invoke one turn: read messages, return assistant content and optional tool_calls.
    async fn invoke(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<LlmResponse, AgentError>;

    /// Invoke one turn and parse the reply as a JSON object matching `schema`.
    ///
    /// The default asks for JSON in a system message and parses the first
    /// object found in the reply. Clients with native structured output override it.
    async fn invoke_structured(
        &self,
        messages: &[Message],
        schema: &Value,
        options: &GenerateOptions,
    ) -> Result<Value, AgentError> {
        let mut request = Vec::with_capacity(messages.len() + 1);
        request.push(Message::system(format!(
            "Reply with a single JSON object matching this JSON schema and nothing else:\n{}",
            schema
        )));
        request.extend_from_slice(messages);
        let response = self.invoke(&request, options).await?;
        parse_json_object(&response.content)
    }
}

/// Extracts the outermost `{...}` from `text` and parses it. Tolerates code fences
/// and prose around the object.
pub fn parse_json_object(text: &str) -> Result<Value, AgentError> {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(AgentError::Provider(format!(
            "expected a JSON object, got: {}",
            text
        )));
    };
    if end < start {
        return Err(AgentError::Provider(format!(
            "expected a JSON object, got: {}",
            text
        )));
    }
    serde_json::from_str(&text[start..=end])
        .map_err(|e| AgentError::Provider(format!("invalid JSON object in reply: {}", e)))
}
