//! Chat node: one generation step over a conversation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Node, NodeOutcome};
use crate::llm::{GenerateOptions, LlmClient};
use crate::message::Message;

use super::MessagesState;

/// Calls the LLM with the conversation and returns the assistant message as a
/// patch (`messages: [assistant]`). Pair with `MessagesState::updater()`.
///
/// An optional system prompt is prepended to every request but never stored.
pub struct ChatNode {
    id: String,
    llm: Arc<dyn LlmClient>,
    options: GenerateOptions,
    system_prompt: Option<String>,
}

impl ChatNode {
    pub fn new(id: impl Into<String>, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            id: id.into(),
            llm,
            options: GenerateOptions::default(),
            system_prompt: None,
        }
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

#[async_trait]
impl Node<MessagesState> for ChatNode {
    fn id(&self) -> &str {
        &self.id
    }

    async fn run(&self, state: MessagesState) -> Result<NodeOutcome<MessagesState>, AgentError> {
        let response = match &self.system_prompt {
            Some(prompt) => {
                let mut request = Vec::with_capacity(state.messages.len() + 1);
                request.push(Message::system(prompt.clone()));
                request.extend(state.messages);
                self.llm.invoke(&request, &self.options).await?
            }
            None => self.llm.invoke(&state.messages, &self.options).await?,
        };
        tracing::debug!(
            node_id = %self.id,
            tool_calls = response.tool_calls.len(),
            "assistant replied"
        );
        Ok(MessagesState {
            messages: vec![response.into_message()],
        }
        .into())
    }
}
