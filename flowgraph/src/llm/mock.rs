//! Mock LLM for tests.
//!
//! Returns scripted responses in order; no network.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::message::{Message, ToolCall};

use super::{GenerateOptions, LlmClient, LlmResponse};

/// Scripted LLM: each `invoke` returns the next response; once the script runs
/// out, the last response repeats. Every request is recorded.
///
/// **Interaction**: Implements `LlmClient`; used by prebuilt node tests and the CLI tests.
pub struct MockLlm {
    script: Vec<LlmResponse>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl MockLlm {
    /// Always answers `content` with no tool calls.
    pub fn with_no_tool_calls(content: impl Into<String>) -> Self {
        Self::scripted(vec![LlmResponse::text(content)])
    }

    /// Answers with the given responses in order.
    pub fn scripted(script: Vec<LlmResponse>) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// First answer requests `tool_calls`; later answers are `final_content`.
    pub fn with_tool_calls(tool_calls: Vec<ToolCall>, final_content: impl Into<String>) -> Self {
        Self::scripted(vec![
            LlmResponse {
                content: String::new(),
                tool_calls,
            },
            LlmResponse::text(final_content),
        ])
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Message lists received so far, oldest first.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(
        &self,
        messages: &[Message],
        _options: &GenerateOptions,
    ) -> Result<LlmResponse, AgentError> {
        let index = {
            let mut calls = self
                .calls
                .lock()
                .map_err(|_| AgentError::Provider("mock llm lock poisoned".into()))?;
            calls.push(messages.to_vec());
            calls.len() - 1
        };
        self.script
            .get(index)
            .or_else(|| self.script.last())
            .cloned()
            .ok_or_else(|| AgentError::Provider("mock llm has no scripted responses".into()))
    }
}
